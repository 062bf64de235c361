//! Staffsync core library: domain types, configuration, errors.
//!
//! Public API surface:
//! - [`types`]: employee records, row identifiers, sync log entries
//! - [`error`]: [`ValidationError`], [`ConfigError`]
//! - [`config`]: [`StaffsyncConfig`] load / resolve

pub mod config;
pub mod error;
pub mod types;

pub use config::StaffsyncConfig;
pub use error::{ConfigError, ValidationError};
pub use types::{
    EmployeeInsert, EmployeeRecord, EmployeeUpsert, NewEmployee, RowId, SyncLogEntry, SyncStatus,
    SYNCED_FROM_TAG,
};

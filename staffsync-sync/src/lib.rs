//! # staffsync-sync
//!
//! Reconciliation between the sheet and the record store, plus the two
//! single-row write paths that bypass it.
//!
//! - [`reconcile`] runs the two-phase sheet ⇄ store pass and logs the run.
//! - [`mirror::apply_change`] replays one store change event onto the sheet.
//! - [`intake::add_employee`] appends a new employee to both sides.
//!
//! [`SyncContext`] bundles the surfaces for the CLI and daemon.

pub mod error;
pub mod intake;
pub mod mirror;
pub mod pipeline;
pub mod reconcile;
pub mod sync_log;

pub use error::{LoggingError, SyncError};
pub use mirror::{ChangeEvent, ChangeRecord, MirrorOutcome, Operation};
pub use pipeline::SyncContext;
pub use reconcile::{reconcile, ReconcileReport, RunPhase, SheetToStoreCounts};

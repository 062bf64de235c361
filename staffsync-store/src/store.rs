//! The record store seam.

use chrono::{DateTime, Utc};

use staffsync_core::{EmployeeInsert, EmployeeRecord, EmployeeUpsert, SyncLogEntry};

use crate::error::StoreError;

/// What an upsert-by-email did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Read-path filter for listing employees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeFilter {
    pub department: Option<String>,
}

/// Employee contact table plus the sync log table.
///
/// Email is the natural key: it is matched exactly and case-sensitively.
pub trait RecordStore: Send + Sync {
    fn find_by_email(&self, email: &str) -> Result<Option<EmployeeRecord>, StoreError>;

    /// Overwrite the mutable fields of the record with this email, or insert
    /// a new record with a fresh identity and `created_at = now`. Never
    /// produces two records for one email.
    fn upsert_by_email(&self, record: &EmployeeUpsert) -> Result<UpsertOutcome, StoreError>;

    /// Plain insert; fails if the email already exists.
    fn insert(&self, record: &EmployeeInsert) -> Result<EmployeeRecord, StoreError>;

    /// Every record, oldest `created_at` first.
    fn list_all(&self) -> Result<Vec<EmployeeRecord>, StoreError>;

    /// Records matching `filter`, ordered by name.
    fn list(&self, filter: &EmployeeFilter) -> Result<Vec<EmployeeRecord>, StoreError>;

    /// Stamp `last_synced_at` / `last_synced_from` on every record.
    fn mark_all_synced(&self, at: DateTime<Utc>, source: &str) -> Result<(), StoreError>;

    fn append_sync_log(&self, entry: &SyncLogEntry) -> Result<(), StoreError>;
}

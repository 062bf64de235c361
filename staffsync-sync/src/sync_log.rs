//! Append-only audit trail of reconciliation runs.

use chrono::{DateTime, Utc};

use staffsync_core::{SyncLogEntry, SyncStatus};
use staffsync_store::RecordStore;

use crate::error::LoggingError;
use crate::reconcile::SheetToStoreCounts;

pub fn success_entry(
    imported: SheetToStoreCounts,
    exported: usize,
    duration_ms: u64,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
) -> SyncLogEntry {
    SyncLogEntry {
        sync_type: SyncLogEntry::BI_DIRECTIONAL.to_string(),
        sheet_to_db: imported.total(),
        db_to_sheet: exported,
        duration_ms,
        status: SyncStatus::Success,
        error_message: None,
        started_at,
        completed_at,
    }
}

/// Failed runs carry zero counts regardless of what was applied before the
/// failure.
pub fn failure_entry(message: impl Into<String>, at: DateTime<Utc>) -> SyncLogEntry {
    SyncLogEntry {
        sync_type: SyncLogEntry::BI_DIRECTIONAL.to_string(),
        sheet_to_db: 0,
        db_to_sheet: 0,
        duration_ms: 0,
        status: SyncStatus::Error,
        error_message: Some(message.into()),
        started_at: at,
        completed_at: at,
    }
}

pub fn record(store: &dyn RecordStore, entry: &SyncLogEntry) -> Result<(), LoggingError> {
    store.append_sync_log(entry)?;
    Ok(())
}

/// Write `entry`, logging and discarding any failure.
pub(crate) fn record_or_warn(store: &dyn RecordStore, entry: &SyncLogEntry) {
    if let Err(err) = record(store, entry) {
        tracing::warn!("{err}");
    }
}

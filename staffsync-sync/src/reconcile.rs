//! Two-phase reconciliation between the sheet and the record store.
//!
//! ```text
//! Idle ─▶ SheetToStore ─▶ StoreToSheet ─▶ Logging ─▶ Idle
//!            │                 │
//!            └──── error ──────┴─▶ error log entry ─▶ Idle
//! ```
//!
//! Phase 1 folds every sheet row into the store by email, one row at a time,
//! so later rows observe earlier ones. Phase 2 rewrites the sheet's data
//! region from the store in `created_at` order. Nothing is rolled back on
//! failure; the next successful run converges both sides.

use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use staffsync_core::{EmployeeUpsert, RowId, SYNCED_FROM_TAG};
use staffsync_sheets::{format_timestamp, synced_row, ContactRow, Row, SheetGrid};
use staffsync_store::{RecordStore, UpsertOutcome};

use crate::error::SyncError;
use crate::sync_log;

// ---------------------------------------------------------------------------
// Run state and report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    SheetToStore,
    StoreToSheet,
    Logging,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Idle => "idle",
            RunPhase::SheetToStore => "sheet-to-store",
            RunPhase::StoreToSheet => "store-to-sheet",
            RunPhase::Logging => "logging",
        };
        f.write_str(name)
    }
}

/// Phase 1 counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetToStoreCounts {
    pub added: usize,
    pub updated: usize,
}

impl SheetToStoreCounts {
    pub fn total(&self) -> usize {
        self.added + self.updated
    }
}

/// Outcome of one successful run, serialized as the reconcile response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub success: bool,
    pub timestamp: String,
    pub sheet_to_db: SheetToStoreCounts,
    pub db_to_sheet: usize,
    pub total_in_db: usize,
    /// Data rows read in phase 1; the header is not counted.
    pub total_in_sheet: usize,
    pub sync_duration_ms: u64,
}

/// What phase 1 saw and did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SheetToStoreOutcome {
    pub counts: SheetToStoreCounts,
    pub rows_seen: usize,
}

// ---------------------------------------------------------------------------
// Phase 1: sheet -> store
// ---------------------------------------------------------------------------

/// Upsert every contact row of the sheet into the store, keyed by email.
///
/// A non-blank sheet identifier always wins. A blank one keeps the store's
/// identifier for known emails and is synthesized (`GS…`) for new ones.
pub fn sheet_to_store(
    grid: &SheetGrid<'_>,
    store: &dyn RecordStore,
    now: DateTime<Utc>,
) -> Result<SheetToStoreOutcome, SyncError> {
    let rows = grid.read_records()?;
    let rows_seen = rows.len().saturating_sub(1);
    let mut counts = SheetToStoreCounts::default();

    for (offset, cells) in rows.iter().enumerate().skip(1) {
        let row = ContactRow::from_cells(cells);
        if !row.has_contact() {
            continue;
        }

        let sheet_id = row.row_id.filter(|id| !id.is_blank());
        let sheet_row_id = match sheet_id {
            Some(id) => id,
            None => match store.find_by_email(&row.email)? {
                Some(existing) => existing.effective_row_id(),
                // Offset keeps ids minted in one run distinct.
                None => RowId::synthesize(
                    RowId::SHEET_PREFIX,
                    now + Duration::milliseconds(offset as i64),
                ),
            },
        };

        let upsert = EmployeeUpsert {
            sheet_row_id,
            name: row.name,
            email: row.email,
            department: row.department,
            phone: row.phone,
            updated_at: now,
            last_synced_at: now,
            last_synced_from: SYNCED_FROM_TAG.to_string(),
        };
        match store.upsert_by_email(&upsert)? {
            UpsertOutcome::Inserted => counts.added += 1,
            UpsertOutcome::Updated => counts.updated += 1,
        }
    }

    Ok(SheetToStoreOutcome { counts, rows_seen })
}

// ---------------------------------------------------------------------------
// Phase 2: store -> sheet
// ---------------------------------------------------------------------------

/// Overwrite the sheet's data region with every store record, oldest first,
/// then stamp every record as synced. Returns the number of rows written.
///
/// Rows below the new data are not cleared. An empty store writes nothing.
pub fn store_to_sheet(
    grid: &SheetGrid<'_>,
    store: &dyn RecordStore,
    now: DateTime<Utc>,
) -> Result<usize, SyncError> {
    let records = store.list_all()?;
    if records.is_empty() {
        tracing::info!("store is empty, leaving sheet untouched");
        return Ok(0);
    }

    let rows: Vec<Row> = records.iter().map(synced_row).collect();
    grid.replace_data_region(&rows)?;
    store.mark_all_synced(now, SYNCED_FROM_TAG)?;
    Ok(records.len())
}

// ---------------------------------------------------------------------------
// Full run
// ---------------------------------------------------------------------------

/// Run both phases and append a sync log entry.
pub fn reconcile(
    grid: &SheetGrid<'_>,
    store: &dyn RecordStore,
) -> Result<ReconcileReport, SyncError> {
    reconcile_at(grid, store, Utc::now())
}

/// [`reconcile`] with every timestamp of the run pinned to `now`.
pub fn reconcile_at(
    grid: &SheetGrid<'_>,
    store: &dyn RecordStore,
    now: DateTime<Utc>,
) -> Result<ReconcileReport, SyncError> {
    let started = Instant::now();
    let mut phase = RunPhase::Idle;
    tracing::info!("reconciliation started");

    match run_phases(grid, store, now, started, &mut phase) {
        Ok(report) => Ok(report),
        Err(err) => {
            tracing::error!("reconciliation failed during {phase}: {err}");
            sync_log::record_or_warn(store, &sync_log::failure_entry(err.to_string(), Utc::now()));
            Err(err)
        }
    }
}

fn run_phases(
    grid: &SheetGrid<'_>,
    store: &dyn RecordStore,
    now: DateTime<Utc>,
    started: Instant,
    phase: &mut RunPhase,
) -> Result<ReconcileReport, SyncError> {
    *phase = RunPhase::SheetToStore;
    let imported = sheet_to_store(grid, store, now)?;
    tracing::info!(
        "sheet -> store: {} row(s) read, added {}, updated {}",
        imported.rows_seen,
        imported.counts.added,
        imported.counts.updated
    );

    *phase = RunPhase::StoreToSheet;
    let exported = store_to_sheet(grid, store, now)?;
    tracing::info!("store -> sheet: wrote {exported} row(s)");

    *phase = RunPhase::Logging;
    let elapsed = started.elapsed();
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    let completed_at = now + Duration::from_std(elapsed).unwrap_or_else(|_| Duration::zero());
    sync_log::record_or_warn(
        store,
        &sync_log::success_entry(imported.counts, exported, duration_ms, now, completed_at),
    );

    *phase = RunPhase::Idle;
    tracing::info!("reconciliation finished in {duration_ms}ms");
    Ok(ReconcileReport {
        success: true,
        timestamp: format_timestamp(now),
        sheet_to_db: imported.counts,
        db_to_sheet: exported,
        total_in_db: exported,
        total_in_sheet: imported.rows_seen,
        sync_duration_ms: duration_ms,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Shared sync entrypoint used by CLI and daemon.

use std::sync::Arc;

use chrono::Utc;

use staffsync_core::{EmployeeRecord, NewEmployee, StaffsyncConfig};
use staffsync_sheets::{GoogleSheetsClient, GridSurface, ServiceAccountTokens, SheetGrid};
use staffsync_store::{EmployeeFilter, PostgrestStore, RecordStore};

use crate::error::SyncError;
use crate::intake;
use crate::mirror::{self, ChangeEvent, MirrorOutcome};
use crate::reconcile::{self, ReconcileReport};

/// The grid surface, the record store and the sheet tab they share.
///
/// Cheap to clone; every operation is blocking and should run off the async
/// executor.
#[derive(Clone)]
pub struct SyncContext {
    grid: Arc<dyn GridSurface>,
    store: Arc<dyn RecordStore>,
    sheet_name: String,
}

impl SyncContext {
    pub fn new(
        grid: Arc<dyn GridSurface>,
        store: Arc<dyn RecordStore>,
        sheet_name: impl Into<String>,
    ) -> Self {
        Self {
            grid,
            store,
            sheet_name: sheet_name.into(),
        }
    }

    /// Google Sheets + PostgREST clients from a resolved configuration.
    pub fn from_config(config: &StaffsyncConfig) -> Result<Self, SyncError> {
        let tokens = ServiceAccountTokens::new(config.google.clone())?;
        let grid = GoogleSheetsClient::new(&config.sheet, Box::new(tokens));
        let store = PostgrestStore::new(&config.store);
        Ok(Self::new(
            Arc::new(grid),
            Arc::new(store),
            config.sheet.sheet_name.clone(),
        ))
    }

    pub fn sheet(&self) -> SheetGrid<'_> {
        SheetGrid::new(self.grid.as_ref(), &self.sheet_name)
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn reconcile(&self) -> Result<ReconcileReport, SyncError> {
        reconcile::reconcile(&self.sheet(), self.store())
    }

    pub fn mirror(&self, event: &ChangeEvent) -> Result<MirrorOutcome, SyncError> {
        mirror::apply_change(&self.sheet(), event, Utc::now())
    }

    pub fn add_employee(&self, employee: NewEmployee) -> Result<EmployeeRecord, SyncError> {
        intake::add_employee(&self.sheet(), self.store(), employee, Utc::now())
    }

    pub fn list_employees(&self, filter: &EmployeeFilter) -> Result<Vec<EmployeeRecord>, SyncError> {
        Ok(self.store.list(filter)?)
    }
}

//! In-process [`RecordStore`] used by tests and local runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use staffsync_core::{EmployeeInsert, EmployeeRecord, EmployeeUpsert, SyncLogEntry};

use crate::error::StoreError;
use crate::store::{EmployeeFilter, RecordStore, UpsertOutcome};

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<EmployeeRecord>>,
    logs: Mutex<Vec<SyncLogEntry>>,
    offline: AtomicBool,
    log_offline: AtomicBool,
    upserts_before_failure: Mutex<Option<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed records as-is, in `created_at` order of the slice.
    pub fn with_records(records: Vec<EmployeeRecord>) -> Self {
        let store = Self::new();
        *store.records() = records;
        store
    }

    pub fn snapshot(&self) -> Vec<EmployeeRecord> {
        self.records().clone()
    }

    pub fn sync_logs(&self) -> Vec<SyncLogEntry> {
        self.logs.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Make every employee-table call fail with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make sync log appends fail while the employee table keeps working.
    pub fn set_log_offline(&self, offline: bool) {
        self.log_offline.store(offline, Ordering::SeqCst);
    }

    /// Allow `n` more successful upserts, then fail every upsert.
    pub fn fail_upserts_after(&self, n: usize) {
        *self
            .upserts_before_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(n);
    }

    fn records(&self) -> MutexGuard<'_, Vec<EmployeeRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".to_string()));
        }
        Ok(())
    }

    fn check_upsert_budget(&self) -> Result<(), StoreError> {
        let mut budget = self
            .upserts_before_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match budget.as_mut() {
            Some(0) => Err(StoreError::Unavailable(
                "memory store rejected upsert".to_string(),
            )),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

fn sorted_by_created(mut records: Vec<EmployeeRecord>) -> Vec<EmployeeRecord> {
    // Stable sort keeps insertion order for equal timestamps.
    records.sort_by_key(|r| r.created_at);
    records
}

impl RecordStore for MemoryStore {
    fn find_by_email(&self, email: &str) -> Result<Option<EmployeeRecord>, StoreError> {
        self.check_online()?;
        Ok(self.records().iter().find(|r| r.email == email).cloned())
    }

    fn upsert_by_email(&self, record: &EmployeeUpsert) -> Result<UpsertOutcome, StoreError> {
        self.check_online()?;
        self.check_upsert_budget()?;
        let mut records = self.records();

        if let Some(existing) = records.iter_mut().find(|r| r.email == record.email) {
            existing.sheet_row_id = Some(record.sheet_row_id.clone());
            existing.name = record.name.clone();
            existing.department = record.department.clone();
            existing.phone = record.phone.clone();
            existing.updated_at = Some(record.updated_at);
            existing.last_synced_at = Some(record.last_synced_at);
            existing.last_synced_from = Some(record.last_synced_from.clone());
            return Ok(UpsertOutcome::Updated);
        }

        records.push(EmployeeRecord {
            id: Uuid::new_v4().to_string(),
            sheet_row_id: Some(record.sheet_row_id.clone()),
            name: record.name.clone(),
            email: record.email.clone(),
            department: record.department.clone(),
            phone: record.phone.clone(),
            created_at: Utc::now(),
            updated_at: Some(record.updated_at),
            last_synced_at: Some(record.last_synced_at),
            last_synced_from: Some(record.last_synced_from.clone()),
        });
        Ok(UpsertOutcome::Inserted)
    }

    fn insert(&self, record: &EmployeeInsert) -> Result<EmployeeRecord, StoreError> {
        self.check_online()?;
        let mut records = self.records();
        if records.iter().any(|r| r.email == record.email) {
            return Err(StoreError::DuplicateEmail {
                email: record.email.clone(),
            });
        }
        let now = Utc::now();
        let created = EmployeeRecord {
            id: Uuid::new_v4().to_string(),
            sheet_row_id: Some(record.sheet_row_id.clone()),
            name: record.name.clone(),
            email: record.email.clone(),
            department: record.department.clone(),
            phone: record.phone.clone(),
            created_at: now,
            updated_at: Some(now),
            last_synced_at: None,
            last_synced_from: None,
        };
        records.push(created.clone());
        Ok(created)
    }

    fn list_all(&self) -> Result<Vec<EmployeeRecord>, StoreError> {
        self.check_online()?;
        Ok(sorted_by_created(self.records().clone()))
    }

    fn list(&self, filter: &EmployeeFilter) -> Result<Vec<EmployeeRecord>, StoreError> {
        self.check_online()?;
        let mut matching: Vec<EmployeeRecord> = self
            .records()
            .iter()
            .filter(|r| match &filter.department {
                Some(department) => r.department.as_ref() == Some(department),
                None => true,
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matching)
    }

    fn mark_all_synced(&self, at: DateTime<Utc>, source: &str) -> Result<(), StoreError> {
        self.check_online()?;
        for record in self.records().iter_mut() {
            record.last_synced_at = Some(at);
            record.last_synced_from = Some(source.to_string());
        }
        Ok(())
    }

    fn append_sync_log(&self, entry: &SyncLogEntry) -> Result<(), StoreError> {
        self.check_online()?;
        if self.log_offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "sync log table is unavailable".to_string(),
            ));
        }
        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.clone());
        Ok(())
    }
}

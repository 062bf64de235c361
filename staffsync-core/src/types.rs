//! Domain types shared by the grid, store, and sync crates.
//!
//! Every type is serializable via serde; the JSON shapes match the store
//! surface's column names so the same structs travel over HTTP unchanged.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Value written to `last_synced_from` by every reconciliation write.
pub const SYNCED_FROM_TAG: &str = "Saved";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Opaque identifier stored in the sheet's first column and mirrored into
/// the store's `sheet_row_id` column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowId(pub String);

impl RowId {
    /// Prefix for identifiers synthesized when a sheet row is first imported.
    pub const SHEET_PREFIX: &'static str = "GS";
    /// Prefix for identifiers synthesized on the store side.
    pub const STORE_PREFIX: &'static str = "DB";
    /// Prefix for identifiers minted by the intake endpoint.
    pub const INTAKE_PREFIX: &'static str = "EMP";

    /// `<prefix><epoch millis>`.
    pub fn synthesize(prefix: &str, at: DateTime<Utc>) -> Self {
        Self(format!("{prefix}{}", at.timestamp_millis()))
    }

    /// `DB<first 8 chars of the store identity>`.
    pub fn from_store_identity(id: &str) -> Self {
        let short: String = id.chars().take(8).collect();
        Self(format!("{}{short}", Self::STORE_PREFIX))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RowId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RowId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Store-side records
// ---------------------------------------------------------------------------

/// An employee contact row as held by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    /// Store-assigned identity. Never written by this system.
    pub id: String,
    #[serde(default)]
    pub sheet_row_id: Option<RowId>,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_synced_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_synced_from: Option<String>,
}

impl EmployeeRecord {
    /// The identifier to show in the sheet, falling back to one derived
    /// from the store identity when the record never received one.
    pub fn effective_row_id(&self) -> RowId {
        match &self.sheet_row_id {
            Some(id) if !id.is_blank() => id.clone(),
            _ => RowId::from_store_identity(&self.id),
        }
    }
}

/// Mutable fields written by an upsert-by-email. `created_at` and the store
/// identity are deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeUpsert {
    pub sheet_row_id: RowId,
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub phone: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub last_synced_at: DateTime<Utc>,
    pub last_synced_from: String,
}

/// A brand-new record created by the intake endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeInsert {
    pub sheet_row_id: RowId,
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub phone: Option<String>,
}

// ---------------------------------------------------------------------------
// Intake input
// ---------------------------------------------------------------------------

/// Body of an add-employee request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEmployee {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl NewEmployee {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() || self.email.trim().is_empty() {
            return Err(ValidationError::NameAndEmailRequired);
        }
        Ok(())
    }

    /// Attach the identifier minted for this employee.
    pub fn into_insert(self, sheet_row_id: RowId) -> EmployeeInsert {
        EmployeeInsert {
            sheet_row_id,
            name: self.name,
            email: self.email,
            department: self.department,
            phone: self.phone,
        }
    }
}

// ---------------------------------------------------------------------------
// Sync log
// ---------------------------------------------------------------------------

/// Outcome recorded for one reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Success,
    Error,
}

/// Append-only audit row written once per reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncLogEntry {
    pub sync_type: String,
    pub sheet_to_db: usize,
    pub db_to_sheet: usize,
    pub duration_ms: u64,
    pub status: SyncStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl SyncLogEntry {
    pub const BI_DIRECTIONAL: &'static str = "bi_directional";
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

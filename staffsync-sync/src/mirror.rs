//! Replays one store change event onto the sheet.
//!
//! Only the record span (A–E) of a row is touched; the sync columns are left
//! as they were. The store is never consulted.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use staffsync_core::{RowId, ValidationError};
use staffsync_sheets::{ContactRow, RowIndex, SheetGrid};

use crate::error::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Insert,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Insert => "INSERT",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row image carried by a change event. Store-only columns are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    #[serde(default)]
    pub sheet_row_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl ChangeRecord {
    fn key(&self) -> &str {
        self.sheet_row_id.as_deref().unwrap_or_default()
    }

    fn to_row(&self, row_id: RowId) -> ContactRow {
        ContactRow {
            row_id: Some(row_id),
            name: self.name.clone().unwrap_or_default(),
            email: self.email.clone().unwrap_or_default(),
            department: self.department.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// `{operation, new_data?, old_data?}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub operation: Operation,
    #[serde(default)]
    pub new_data: Option<ChangeRecord>,
    #[serde(default)]
    pub old_data: Option<ChangeRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorOutcome {
    Appended(RowIndex),
    Updated(RowIndex),
    Cleared(RowIndex),
    /// DELETE for an identifier the sheet does not contain.
    NotFound,
}

/// Apply `event` to the sheet.
///
/// An UPDATE whose identifier is not in the sheet is appended exactly as an
/// INSERT of the same payload would be.
pub fn apply_change(
    grid: &SheetGrid<'_>,
    event: &ChangeEvent,
    now: DateTime<Utc>,
) -> Result<MirrorOutcome, SyncError> {
    match event.operation {
        Operation::Insert => append(grid, payload(event, &event.new_data, "new_data")?, now),
        Operation::Update => {
            let data = payload(event, &event.new_data, "new_data")?;
            match grid.find_row_by_key(data.key())? {
                Some(row) => {
                    let cells = data.to_row(RowId::from(data.key())).to_cells();
                    grid.write_row(row, &cells)?;
                    tracing::info!("updated row {row} with id {}", data.key());
                    Ok(MirrorOutcome::Updated(row))
                }
                None => {
                    tracing::info!("row {:?} not found, appending instead", data.key());
                    append(grid, data, now)
                }
            }
        }
        Operation::Delete => {
            let data = payload(event, &event.old_data, "old_data")?;
            match grid.find_row_by_key(data.key())? {
                Some(row) => {
                    grid.clear_row(row)?;
                    tracing::info!("cleared row {row} with id {}", data.key());
                    Ok(MirrorOutcome::Cleared(row))
                }
                None => {
                    tracing::info!("row {:?} not found for deletion", data.key());
                    Ok(MirrorOutcome::NotFound)
                }
            }
        }
    }
}

fn payload<'e>(
    event: &ChangeEvent,
    data: &'e Option<ChangeRecord>,
    field: &'static str,
) -> Result<&'e ChangeRecord, ValidationError> {
    data.as_ref().ok_or(ValidationError::MissingPayload {
        operation: event.operation.as_str(),
        field,
    })
}

fn append(
    grid: &SheetGrid<'_>,
    data: &ChangeRecord,
    now: DateTime<Utc>,
) -> Result<MirrorOutcome, SyncError> {
    let row_id = match data.key() {
        "" => RowId::synthesize(RowId::STORE_PREFIX, now),
        key => RowId::from(key),
    };
    let row = grid.append_row(&data.to_row(row_id.clone()).to_cells())?;
    tracing::info!("added row {row} with id {row_id}");
    Ok(MirrorOutcome::Appended(row))
}

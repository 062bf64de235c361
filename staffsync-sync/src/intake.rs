//! Direct add-employee path: one sheet append, then one store insert.
//!
//! The two writes are not transactional. If the insert fails the sheet is
//! ahead of the store until the next reconciliation imports the row.

use chrono::{DateTime, Utc};

use staffsync_core::{EmployeeRecord, NewEmployee, RowId};
use staffsync_sheets::{ContactRow, SheetGrid};
use staffsync_store::RecordStore;

use crate::error::SyncError;

pub fn add_employee(
    grid: &SheetGrid<'_>,
    store: &dyn RecordStore,
    employee: NewEmployee,
    now: DateTime<Utc>,
) -> Result<EmployeeRecord, SyncError> {
    employee.validate()?;

    let row_id = RowId::synthesize(RowId::INTAKE_PREFIX, now);
    let insert = NewEmployee {
        department: non_blank(employee.department),
        phone: non_blank(employee.phone),
        ..employee
    }
    .into_insert(row_id);

    let cells = ContactRow {
        row_id: Some(insert.sheet_row_id.clone()),
        name: insert.name.clone(),
        email: insert.email.clone(),
        department: insert.department.clone(),
        phone: insert.phone.clone(),
    }
    .to_cells();
    let row = grid.append_row(&cells)?;
    tracing::info!("appended {} at row {row}", insert.sheet_row_id);

    let record = store.insert(&insert)?;
    tracing::info!("stored employee {} as {}", record.email, record.id);
    Ok(record)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

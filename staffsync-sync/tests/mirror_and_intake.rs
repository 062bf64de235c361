use chrono::{DateTime, TimeZone, Utc};

use staffsync_core::{NewEmployee, RowId};
use staffsync_sheets::{MemoryGrid, RowIndex, SheetGrid};
use staffsync_store::{MemoryStore, RecordStore};
use staffsync_sync::intake::add_employee;
use staffsync_sync::mirror::apply_change;
use staffsync_sync::{ChangeEvent, ChangeRecord, MirrorOutcome, Operation, SyncError};

const SHEET: &str = "Sheet1";
const HEADER: &[&str] = &["ID", "Name", "Email", "Department", "Phone"];

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
}

fn change(id: Option<&str>, name: &str, email: &str) -> ChangeRecord {
    ChangeRecord {
        sheet_row_id: id.map(str::to_string),
        name: Some(name.to_string()),
        email: Some(email.to_string()),
        department: Some("Ops".to_string()),
        phone: None,
    }
}

fn event(operation: Operation, data: ChangeRecord) -> ChangeEvent {
    match operation {
        Operation::Delete => ChangeEvent {
            operation,
            new_data: None,
            old_data: Some(data),
        },
        _ => ChangeEvent {
            operation,
            new_data: Some(data),
            old_data: None,
        },
    }
}

// ---------------------------------------------------------------------------
// Mirror
// ---------------------------------------------------------------------------

#[test]
fn insert_appends_under_existing_rows() {
    let grid = MemoryGrid::with_rows(SHEET, &[HEADER, &["E1", "Alice", "a@x.com"]]);
    let sheet = SheetGrid::new(&grid, SHEET);

    let outcome =
        apply_change(&sheet, &event(Operation::Insert, change(Some("E2"), "Bob", "b@x.com")), now())
            .expect("insert");

    assert_eq!(outcome, MirrorOutcome::Appended(RowIndex(3)));
    assert_eq!(grid.rows(SHEET)[2], vec!["E2", "Bob", "b@x.com", "Ops"]);
}

#[test]
fn insert_into_empty_sheet_starts_below_header_and_mints_id() {
    let grid = MemoryGrid::new();
    let sheet = SheetGrid::new(&grid, SHEET);

    let outcome =
        apply_change(&sheet, &event(Operation::Insert, change(None, "Bob", "b@x.com")), now())
            .expect("insert");

    assert_eq!(outcome, MirrorOutcome::Appended(RowIndex::FIRST_DATA));
    let rows = grid.rows(SHEET);
    assert!(rows[0].is_empty(), "header row stays untouched");
    assert_eq!(rows[1][0], format!("DB{}", now().timestamp_millis()));
}

#[test]
fn update_overwrites_record_span_and_keeps_sync_columns() {
    let grid = MemoryGrid::with_rows(
        SHEET,
        &[
            HEADER,
            &["E1", "Alice", "a@x.com", "Eng", "555", "2024-04-01T00:00:00.000Z", "Saved"],
            &["E2", "Bob", "b@x.com"],
        ],
    );
    let sheet = SheetGrid::new(&grid, SHEET);

    let outcome = apply_change(
        &sheet,
        &event(Operation::Update, change(Some("E1"), "Alice Smith", "alice@x.com")),
        now(),
    )
    .expect("update");

    assert_eq!(outcome, MirrorOutcome::Updated(RowIndex(2)));
    assert_eq!(
        grid.rows(SHEET)[1],
        vec![
            "E1",
            "Alice Smith",
            "alice@x.com",
            "Ops",
            "",
            "2024-04-01T00:00:00.000Z",
            "Saved"
        ]
    );
    assert_eq!(grid.rows(SHEET)[2], vec!["E2", "Bob", "b@x.com"]);
}

#[test]
fn update_for_unknown_id_matches_insert_of_same_payload() {
    let seed: &[&[&str]] = &[HEADER, &["E1", "Alice", "a@x.com"]];
    let updated = MemoryGrid::with_rows(SHEET, seed);
    let inserted = MemoryGrid::with_rows(SHEET, seed);
    let payload = change(Some("E404"), "Zed", "z@x.com");

    let via_update = apply_change(
        &SheetGrid::new(&updated, SHEET),
        &event(Operation::Update, payload.clone()),
        now(),
    )
    .expect("update");
    let via_insert = apply_change(
        &SheetGrid::new(&inserted, SHEET),
        &event(Operation::Insert, payload),
        now(),
    )
    .expect("insert");

    assert_eq!(via_update, via_insert);
    assert_eq!(updated.rows(SHEET), inserted.rows(SHEET));
}

#[test]
fn delete_blanks_the_row_without_shifting_later_rows() {
    let grid = MemoryGrid::with_rows(
        SHEET,
        &[HEADER, &["E1", "Alice", "a@x.com"], &["E2", "Bob", "b@x.com"]],
    );
    let sheet = SheetGrid::new(&grid, SHEET);

    let outcome =
        apply_change(&sheet, &event(Operation::Delete, change(Some("E1"), "", "")), now())
            .expect("delete");

    assert_eq!(outcome, MirrorOutcome::Cleared(RowIndex(2)));
    let rows = grid.rows(SHEET);
    assert!(rows[1].is_empty());
    assert_eq!(rows[2], vec!["E2", "Bob", "b@x.com"]);
    assert_eq!(sheet.find_row_by_key("E2").unwrap(), Some(RowIndex(3)));
}

#[test]
fn delete_for_unknown_id_is_a_no_op() {
    let grid = MemoryGrid::with_rows(SHEET, &[HEADER, &["E1", "Alice", "a@x.com"]]);
    let before = grid.rows(SHEET);

    let outcome = apply_change(
        &SheetGrid::new(&grid, SHEET),
        &event(Operation::Delete, change(Some("E404"), "", "")),
        now(),
    )
    .expect("delete must not fail");

    assert_eq!(outcome, MirrorOutcome::NotFound);
    assert_eq!(grid.rows(SHEET), before);
    assert_eq!(grid.write_count(), 0);
}

#[test]
fn header_cell_is_never_matched() {
    let grid = MemoryGrid::with_rows(SHEET, &[&["ID", "Name"], &["E1", "Alice", "a@x.com"]]);
    let outcome = apply_change(
        &SheetGrid::new(&grid, SHEET),
        &event(Operation::Delete, change(Some("ID"), "", "")),
        now(),
    )
    .expect("delete");
    assert_eq!(outcome, MirrorOutcome::NotFound);
}

#[test]
fn grid_outage_surfaces_as_grid_error() {
    let grid = MemoryGrid::new();
    grid.set_offline(true);
    let err = apply_change(
        &SheetGrid::new(&grid, SHEET),
        &event(Operation::Update, change(Some("E1"), "A", "a@x.com")),
        now(),
    )
    .unwrap_err();
    assert!(matches!(err, SyncError::Grid(_)));
}

// ---------------------------------------------------------------------------
// Intake
// ---------------------------------------------------------------------------

fn new_employee(name: &str, email: &str) -> NewEmployee {
    NewEmployee {
        name: name.to_string(),
        email: email.to_string(),
        department: Some("Eng".to_string()),
        phone: Some("555".to_string()),
    }
}

#[test]
fn intake_writes_both_sides_with_one_identifier() {
    let grid = MemoryGrid::with_rows(SHEET, &[HEADER]);
    let store = MemoryStore::new();
    let sheet = SheetGrid::new(&grid, SHEET);

    let record = add_employee(&sheet, &store, new_employee("Dana", "d@x.com"), now()).expect("add");

    let expected_id = RowId::from(format!("EMP{}", now().timestamp_millis()));
    assert_eq!(record.sheet_row_id, Some(expected_id.clone()));
    assert_eq!(
        store.find_by_email("d@x.com").unwrap().unwrap().sheet_row_id,
        Some(expected_id.clone())
    );
    let row = sheet.find_row_by_key(expected_id.as_str()).unwrap().expect("row");
    assert_eq!(row, RowIndex::FIRST_DATA);
    assert_eq!(grid.rows(SHEET)[1], vec![expected_id.0.as_str(), "Dana", "d@x.com", "Eng", "555"]);
}

#[test]
fn intake_store_failure_leaves_the_sheet_ahead() {
    let grid = MemoryGrid::with_rows(SHEET, &[HEADER]);
    let store = MemoryStore::new();
    store.set_offline(true);

    let err = add_employee(&SheetGrid::new(&grid, SHEET), &store, new_employee("Dana", "d@x.com"), now())
        .unwrap_err();

    assert!(matches!(err, SyncError::Store(_)));
    assert_eq!(grid.rows(SHEET).len(), 2);
}

#[test]
fn intake_then_reconcile_converges_without_duplicates() {
    let grid = MemoryGrid::with_rows(SHEET, &[HEADER]);
    let store = MemoryStore::new();
    store.set_offline(true);
    let sheet = SheetGrid::new(&grid, SHEET);
    add_employee(&sheet, &store, new_employee("Dana", "d@x.com"), now()).unwrap_err();
    store.set_offline(false);

    let report = staffsync_sync::reconcile(&sheet, &store).expect("reconcile");

    assert_eq!(report.sheet_to_db.added, 1);
    let records = store.snapshot();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].sheet_row_id,
        Some(RowId::from(format!("EMP{}", now().timestamp_millis())))
    );
}

#[test]
fn intake_rejects_blank_name() {
    let grid = MemoryGrid::new();
    let store = MemoryStore::new();
    let err = add_employee(&SheetGrid::new(&grid, SHEET), &store, new_employee("   ", "d@x.com"), now())
        .unwrap_err();
    assert!(matches!(err, SyncError::Validation(_)));
    assert_eq!(grid.write_count(), 0);
}

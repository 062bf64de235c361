//! Typed views over positional sheet rows.
//!
//! Column layout:
//!
//! ```text
//! A            B     C      D           E      F               G
//! sheet_row_id name  email  department  phone  last_synced_at  last_synced_from
//! ```
//!
//! Record-shaped writes (intake, mirror) touch A–E; the full-region export
//! writes A–G.

use chrono::{DateTime, SecondsFormat, Utc};

use staffsync_core::{EmployeeRecord, RowId};

/// One row of cell values. Reads may be ragged: trailing blank cells are
/// absent rather than empty strings.
pub type Row = Vec<String>;

/// Columns A–E.
pub const RECORD_WIDTH: usize = 5;
/// Columns A–G.
pub const SYNCED_WIDTH: usize = 7;

/// A record-shaped row (columns A–E).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactRow {
    pub row_id: Option<RowId>,
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub phone: Option<String>,
}

impl ContactRow {
    /// Decode a possibly-ragged row. Missing or blank optional cells become
    /// `None`; missing required cells become empty strings.
    pub fn from_cells(cells: &[String]) -> Self {
        let cell = |i: usize| cells.get(i).cloned().unwrap_or_default();
        let optional = |i: usize| cells.get(i).filter(|v| !v.is_empty()).cloned();
        Self {
            row_id: optional(0).map(RowId::from),
            name: cell(1),
            email: cell(2),
            department: optional(3),
            phone: optional(4),
        }
    }

    /// Rows without both a name and an email are ignored by imports.
    pub fn has_contact(&self) -> bool {
        !self.name.trim().is_empty() && !self.email.trim().is_empty()
    }

    /// Encode as exactly [`RECORD_WIDTH`] cells.
    pub fn to_cells(&self) -> Row {
        vec![
            self.row_id.as_ref().map(|id| id.0.clone()).unwrap_or_default(),
            self.name.clone(),
            self.email.clone(),
            self.department.clone().unwrap_or_default(),
            self.phone.clone().unwrap_or_default(),
        ]
    }
}

/// Encode a store record as exactly [`SYNCED_WIDTH`] cells.
pub fn synced_row(record: &EmployeeRecord) -> Row {
    vec![
        record.effective_row_id().0,
        record.name.clone(),
        record.email.clone(),
        record.department.clone().unwrap_or_default(),
        record.phone.clone().unwrap_or_default(),
        record.last_synced_at.map(format_timestamp).unwrap_or_default(),
        record.last_synced_from.clone().unwrap_or_default(),
    ]
}

/// `2024-05-01T10:00:00.123Z`
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cells(values: &[&str]) -> Row {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn ragged_row_decodes_with_defaults() {
        let row = ContactRow::from_cells(&cells(&["", "Alice", "a@x.com"]));
        assert_eq!(row.row_id, None);
        assert_eq!(row.name, "Alice");
        assert_eq!(row.department, None);
        assert_eq!(row.phone, None);
        assert!(row.has_contact());

        let empty = ContactRow::from_cells(&[]);
        assert!(!empty.has_contact());
    }

    #[test]
    fn whitespace_only_contact_is_not_importable() {
        let row = ContactRow::from_cells(&cells(&["E1", " ", "a@x.com"]));
        assert!(!row.has_contact());
    }

    #[test]
    fn contact_row_encodes_five_cells() {
        let row = ContactRow {
            row_id: Some(RowId::from("E1")),
            name: "Alice".to_string(),
            email: "a@x.com".to_string(),
            department: None,
            phone: Some("555".to_string()),
        };
        assert_eq!(row.to_cells(), cells(&["E1", "Alice", "a@x.com", "", "555"]));
    }

    #[test]
    fn synced_row_has_seven_cells_and_fallback_id() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let record = EmployeeRecord {
            id: "abcdef0123456789".to_string(),
            sheet_row_id: None,
            name: "Bob".to_string(),
            email: "b@x.com".to_string(),
            department: Some("Ops".to_string()),
            phone: None,
            created_at: at,
            updated_at: None,
            last_synced_at: Some(at),
            last_synced_from: Some("Saved".to_string()),
        };
        assert_eq!(
            synced_row(&record),
            cells(&[
                "DBabcdef01",
                "Bob",
                "b@x.com",
                "Ops",
                "",
                "2024-05-01T10:00:00.000Z",
                "Saved",
            ])
        );
    }
}

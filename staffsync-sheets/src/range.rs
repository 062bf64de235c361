//! A1-style range addressing and logical-to-physical row mapping.
//!
//! Rows are 1-based physical positions; row 1 is the header. Columns are
//! 0-based internally and rendered as letters (`0 → A`, `26 → AA`).

use std::collections::HashMap;
use std::fmt;

use crate::row::Row;

// ---------------------------------------------------------------------------
// RowIndex
// ---------------------------------------------------------------------------

/// Physical 1-based row number in the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowIndex(pub u32);

impl RowIndex {
    pub const HEADER: RowIndex = RowIndex(1);
    pub const FIRST_DATA: RowIndex = RowIndex(2);

    /// Row holding element `offset` of a read that started at `first`.
    pub fn at_offset(first: RowIndex, offset: usize) -> RowIndex {
        RowIndex(first.0 + offset as u32)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RowIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// RangeSpec
// ---------------------------------------------------------------------------

/// A rectangular range on one sheet: `Sheet1!A2:G`, `Sheet1!A:E`,
/// `Sheet1!A5:E5`. Open row bounds extend to the sheet edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSpec {
    pub sheet: String,
    pub first_col: u32,
    pub last_col: u32,
    pub first_row: Option<u32>,
    pub last_row: Option<u32>,
}

impl RangeSpec {
    /// Whole columns: `Sheet1!A:E`.
    pub fn columns(sheet: impl Into<String>, first_col: u32, last_col: u32) -> Self {
        Self {
            sheet: sheet.into(),
            first_col,
            last_col,
            first_row: None,
            last_row: None,
        }
    }

    /// From `row` down to the last row: `Sheet1!A2:G`.
    pub fn from_row(sheet: impl Into<String>, first_col: u32, last_col: u32, row: RowIndex) -> Self {
        Self {
            sheet: sheet.into(),
            first_col,
            last_col,
            first_row: Some(row.0),
            last_row: None,
        }
    }

    /// Exactly one row: `Sheet1!A5:E5`.
    pub fn single_row(
        sheet: impl Into<String>,
        first_col: u32,
        last_col: u32,
        row: RowIndex,
    ) -> Self {
        Self {
            sheet: sheet.into(),
            first_col,
            last_col,
            first_row: Some(row.0),
            last_row: Some(row.0),
        }
    }

    pub fn width(&self) -> usize {
        (self.last_col - self.first_col + 1) as usize
    }

    /// First physical row covered (row 1 when the start is open).
    pub fn start_row(&self) -> RowIndex {
        RowIndex(self.first_row.unwrap_or(1))
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_sheet_name(f, &self.sheet)?;
        f.write_str("!")?;
        f.write_str(&column_letters(self.first_col))?;
        if let Some(row) = self.first_row {
            write!(f, "{row}")?;
        }
        f.write_str(":")?;
        f.write_str(&column_letters(self.last_col))?;
        if let Some(row) = self.last_row {
            write!(f, "{row}")?;
        }
        Ok(())
    }
}

fn write_sheet_name(f: &mut fmt::Formatter<'_>, sheet: &str) -> fmt::Result {
    let plain = !sheet.is_empty() && sheet.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        f.write_str(sheet)
    } else {
        write!(f, "'{}'", sheet.replace('\'', "''"))
    }
}

/// `0 → A`, `25 → Z`, `26 → AA`.
pub fn column_letters(index: u32) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

// ---------------------------------------------------------------------------
// RowMap
// ---------------------------------------------------------------------------

/// Identifier → physical row, recomputed from a fresh read for every
/// operation so callers never rely on array positions.
#[derive(Debug, Clone, Default)]
pub struct RowMap {
    rows: HashMap<String, RowIndex>,
}

impl RowMap {
    /// Index the key column of rows read from row 1. The header row is not
    /// addressable; blank keys are skipped; the first occurrence wins.
    pub fn build(rows: &[Row], key_col: usize) -> Self {
        let mut map = HashMap::new();
        for (offset, row) in rows.iter().enumerate().skip(1) {
            let Some(key) = row.get(key_col) else {
                continue;
            };
            if key.is_empty() {
                continue;
            }
            map.entry(key.clone())
                .or_insert_with(|| RowIndex::at_offset(RowIndex::HEADER, offset));
        }
        Self { rows: map }
    }

    /// Exact, case-sensitive match.
    pub fn locate(&self, key: &str) -> Option<RowIndex> {
        if key.is_empty() {
            return None;
        }
        self.rows.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Linear scan of column 0 for `key` over rows read from row 1.
pub fn find_row_by_key(rows: &[Row], key: &str) -> Option<RowIndex> {
    RowMap::build(rows, 0).locate(key)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Row primitives over a [`GridSurface`].
//!
//! Every primitive re-reads what it needs; nothing caches physical row
//! positions between calls.

use crate::error::GridError;
use crate::range::{RangeSpec, RowIndex, RowMap};
use crate::row::{Row, RECORD_WIDTH, SYNCED_WIDTH};

const KEY_COLUMN: u32 = 0;

/// Raw rectangular access to a spreadsheet-like store.
///
/// Implementations must return ragged rows: trailing blank cells and
/// trailing blank rows are omitted, interior blank rows are empty vectors.
pub trait GridSurface: Send + Sync {
    fn read(&self, range: &RangeSpec) -> Result<Vec<Row>, GridError>;

    /// Write `rows` starting at the top-left of `range`. Values are
    /// interpreted as if typed by a user.
    fn write(&self, range: &RangeSpec, rows: &[Row]) -> Result<(), GridError>;

    /// Blank every cell in `range` without removing rows.
    fn clear(&self, range: &RangeSpec) -> Result<(), GridError>;
}

/// One sheet (tab) of a grid surface, addressed with the contact layout.
pub struct SheetGrid<'a> {
    surface: &'a dyn GridSurface,
    sheet: &'a str,
}

impl<'a> SheetGrid<'a> {
    pub fn new(surface: &'a dyn GridSurface, sheet: &'a str) -> Self {
        Self { surface, sheet }
    }

    pub fn read_range(&self, range: &RangeSpec) -> Result<Vec<Row>, GridError> {
        self.surface.read(range)
    }

    /// Header plus every record-shaped row (`A:E`), starting at row 1.
    pub fn read_records(&self) -> Result<Vec<Row>, GridError> {
        self.read_range(&self.record_columns())
    }

    /// Write `values` one row past the last non-empty key cell. An empty
    /// key column puts the first row at row 2, under the header.
    pub fn append_row(&self, values: &[String]) -> Result<RowIndex, GridError> {
        let key_column = RangeSpec::columns(self.sheet, KEY_COLUMN, KEY_COLUMN);
        let used = self.surface.read(&key_column)?.len() as u32;
        let target = RowIndex((used + 1).max(RowIndex::FIRST_DATA.get()));
        self.write_row(target, values)?;
        Ok(target)
    }

    /// Overwrite the record span (`A{n}:E{n}`) of one row.
    pub fn write_row(&self, row: RowIndex, values: &[String]) -> Result<(), GridError> {
        let range = self.record_span(row);
        if values.len() > range.width() {
            return Err(GridError::OutOfRange {
                range: range.to_string(),
                reason: format!("{} values for {} columns", values.len(), range.width()),
            });
        }
        self.surface.write(&range, &[values.to_vec()])
    }

    /// Physical row whose key cell equals `key` exactly, if any.
    pub fn find_row_by_key(&self, key: &str) -> Result<Option<RowIndex>, GridError> {
        if key.is_empty() {
            return Ok(None);
        }
        let rows = self.read_records()?;
        Ok(RowMap::build(&rows, KEY_COLUMN as usize).locate(key))
    }

    /// Blank the record span of one row; later rows keep their positions.
    pub fn clear_row(&self, row: RowIndex) -> Result<(), GridError> {
        self.surface.clear(&self.record_span(row))
    }

    /// Overwrite `A2:G` from the top with `rows`. Rows below the new data
    /// are left untouched.
    pub fn replace_data_region(&self, rows: &[Row]) -> Result<(), GridError> {
        let range = RangeSpec::from_row(
            self.sheet,
            KEY_COLUMN,
            SYNCED_WIDTH as u32 - 1,
            RowIndex::FIRST_DATA,
        );
        self.surface.write(&range, rows)
    }

    fn record_columns(&self) -> RangeSpec {
        RangeSpec::columns(self.sheet, KEY_COLUMN, RECORD_WIDTH as u32 - 1)
    }

    fn record_span(&self, row: RowIndex) -> RangeSpec {
        RangeSpec::single_row(self.sheet, KEY_COLUMN, RECORD_WIDTH as u32 - 1, row)
    }
}

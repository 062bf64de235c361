//! In-process [`GridSurface`] with the same ragged-read behaviour as the
//! Sheets API. Used by the engine and daemon tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::error::GridError;
use crate::grid::GridSurface;
use crate::range::RangeSpec;
use crate::row::Row;

#[derive(Debug, Default)]
pub struct MemoryGrid {
    sheets: Mutex<HashMap<String, Vec<Row>>>,
    offline: AtomicBool,
    writes_before_failure: Mutex<Option<usize>>,
    write_calls: AtomicUsize,
}

impl MemoryGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed one sheet, row 1 first.
    pub fn with_rows(sheet: &str, rows: &[&[&str]]) -> Self {
        let grid = Self::new();
        let seeded: Vec<Row> = rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect();
        grid.lock().insert(sheet.to_string(), seeded);
        grid
    }

    /// Ragged snapshot of the whole sheet, row 1 first.
    pub fn rows(&self, sheet: &str) -> Vec<Row> {
        let sheets = self.lock();
        let Some(cells) = sheets.get(sheet) else {
            return Vec::new();
        };
        let mut rows: Vec<Row> = cells.iter().map(|r| trim_row(r.clone())).collect();
        trim_trailing_rows(&mut rows);
        rows
    }

    /// Make every subsequent call fail with [`GridError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Allow `n` more successful writes, then fail every write.
    pub fn fail_writes_after(&self, n: usize) {
        *self
            .writes_before_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(n);
    }

    /// Number of `write` calls that reached the surface.
    pub fn write_count(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Row>>> {
        self.sheets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_online(&self) -> Result<(), GridError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(GridError::Unavailable("memory grid is offline".to_string()));
        }
        Ok(())
    }

    fn check_write_budget(&self) -> Result<(), GridError> {
        let mut budget = self
            .writes_before_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match budget.as_mut() {
            Some(0) => Err(GridError::Unavailable(
                "memory grid rejected write".to_string(),
            )),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl GridSurface for MemoryGrid {
    fn read(&self, range: &RangeSpec) -> Result<Vec<Row>, GridError> {
        self.check_online()?;
        let sheets = self.lock();
        let Some(cells) = sheets.get(&range.sheet) else {
            return Ok(Vec::new());
        };

        let first = range.start_row().get() as usize - 1;
        let last = range
            .last_row
            .map(|r| r as usize)
            .unwrap_or(cells.len())
            .min(cells.len());
        let (c0, c1) = (range.first_col as usize, range.last_col as usize);

        let mut rows = Vec::new();
        for row in cells.iter().take(last).skip(first) {
            let slice: Row = (c0..=c1)
                .map(|c| row.get(c).cloned().unwrap_or_default())
                .collect();
            rows.push(trim_row(slice));
        }
        trim_trailing_rows(&mut rows);
        Ok(rows)
    }

    fn write(&self, range: &RangeSpec, rows: &[Row]) -> Result<(), GridError> {
        self.check_online()?;
        self.check_write_budget()?;
        self.write_calls.fetch_add(1, Ordering::SeqCst);

        if rows.iter().any(|r| r.len() > range.width()) {
            return Err(GridError::OutOfRange {
                range: range.to_string(),
                reason: format!("row wider than {} columns", range.width()),
            });
        }
        if let (Some(first), Some(last)) = (range.first_row, range.last_row) {
            let height = (last - first + 1) as usize;
            if rows.len() > height {
                return Err(GridError::OutOfRange {
                    range: range.to_string(),
                    reason: format!("{} rows for {height} row(s)", rows.len()),
                });
            }
        }

        let mut sheets = self.lock();
        let cells = sheets.entry(range.sheet.clone()).or_default();
        let top = range.start_row().get() as usize - 1;
        let left = range.first_col as usize;
        for (i, values) in rows.iter().enumerate() {
            let r = top + i;
            if cells.len() <= r {
                cells.resize(r + 1, Vec::new());
            }
            let target = &mut cells[r];
            for (j, value) in values.iter().enumerate() {
                let c = left + j;
                if target.len() <= c {
                    target.resize(c + 1, String::new());
                }
                target[c] = value.clone();
            }
        }
        Ok(())
    }

    fn clear(&self, range: &RangeSpec) -> Result<(), GridError> {
        self.check_online()?;
        let mut sheets = self.lock();
        let Some(cells) = sheets.get_mut(&range.sheet) else {
            return Ok(());
        };
        let first = range.start_row().get() as usize - 1;
        let last = range
            .last_row
            .map(|r| r as usize)
            .unwrap_or(cells.len())
            .min(cells.len());
        for row in cells.iter_mut().take(last).skip(first) {
            for c in range.first_col as usize..=range.last_col as usize {
                if let Some(cell) = row.get_mut(c) {
                    cell.clear();
                }
            }
        }
        Ok(())
    }
}

fn trim_row(mut row: Row) -> Row {
    while row.last().is_some_and(|c| c.is_empty()) {
        row.pop();
    }
    row
}

fn trim_trailing_rows(rows: &mut Vec<Row>) {
    while rows.last().is_some_and(|r| r.is_empty()) {
        rows.pop();
    }
}

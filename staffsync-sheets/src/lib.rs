//! # staffsync-sheets
//!
//! Grid addressing over a spreadsheet-like surface.
//!
//! [`GridSurface`] is the raw read / write / clear seam; [`SheetGrid`] layers
//! the row primitives (append, write, locate, clear, full-region replace) on
//! top of it. [`GoogleSheetsClient`] talks to the Sheets v4 API and
//! [`MemoryGrid`] backs tests.

pub mod auth;
pub mod error;
pub mod google;
pub mod grid;
pub mod memory;
pub mod range;
pub mod row;

pub use auth::{ServiceAccountTokens, StaticToken, TokenSource};
pub use error::GridError;
pub use google::GoogleSheetsClient;
pub use grid::{GridSurface, SheetGrid};
pub use memory::MemoryGrid;
pub use range::{find_row_by_key, RangeSpec, RowIndex, RowMap};
pub use row::{format_timestamp, synced_row, ContactRow, Row, RECORD_WIDTH, SYNCED_WIDTH};

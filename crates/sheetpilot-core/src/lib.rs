//! Shared spreadsheet addressing types for the sheetpilot crates.
//!
//! Both automation clients (the desktop Excel bridge and the Google Sheets
//! REST client) address cells in A1 notation. This crate owns the conversion
//! between A1 labels and 0-based `(row, col)` indices, plus rectangular
//! ranges and their iteration order, so the two clients agree on what an
//! address means.

mod address;
mod error;

pub use address::{CellAddress, CellRange, RangeCells};
pub use error::{Error, Result};

/// Number of addressable rows (A1 rows 1..=1,048,576).
pub const MAX_ROWS: u32 = 1_048_576;

/// Number of addressable columns (A..XFD).
pub const MAX_COLS: u16 = 16_384;

//! Google Sheets automation client for sheetpilot.
//!
//! This crate wraps the Sheets v4 and Drive v3 REST APIs directly with
//! `reqwest`: service-account authentication, opening a spreadsheet by its
//! exact title, and range-level reads and writes.
//!
//! The one structural rule is batching: a [`CellBatch`] is fetched in one
//! call, mutated entirely in local memory, and flushed in one call. Nothing
//! in this crate issues a network request per cell.
//!
//! # Example
//!
//! ```rust,no_run
//! use sheetpilot_gsheets::{product_grid, Client, ServiceAccountKey, ValueInputOption};
//!
//! # async fn example() -> sheetpilot_gsheets::Result<()> {
//! let key = ServiceAccountKey::from_file("client_secret.json".as_ref())?;
//! let client = Client::authorize(&key).await?;
//! let spreadsheet = client.open_by_title("Budget 2024").await?;
//! let sheet = spreadsheet.sheet1();
//!
//! let mut grid = sheet.range("A1:J10").await?;
//! product_grid(&mut grid);
//! sheet.update_cells(&grid, ValueInputOption::Raw).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod batch;
pub mod client;
pub mod error;
pub mod worksheet;

pub use auth::{ServiceAccountKey, SCOPES};
pub use batch::{product_grid, sum_formula, write_column_sums, write_row_sums, Cell, CellBatch};
pub use client::{Client, Spreadsheet};
pub use error::{Error, Result};
pub use worksheet::{ValueInputOption, Worksheet};

//! Native client library for automating a running desktop Excel through a
//! WINE bridge process.
//!
//! The bridge is a Windows `.exe` that attaches to the live
//! `Excel.Application` COM instance; this crate spawns it under WINE and
//! drives it over JSON-over-stdio. The workbook being manipulated is assumed
//! to already be open in the application - attaching to it is explicit and
//! fails fast if it is not.
//!
//! # Architecture
//!
//! ```text
//! Your Rust code (native Linux)
//!     └── Bridge (this crate)
//!           └── spawns: wine xl-bridge.exe
//!                 └── COM: running Excel.Application
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use sheetpilot_excel::{Bridge, BridgeConfig, Rgb};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bridge = Bridge::start(BridgeConfig::default())?;
//!     let ws = bridge.attach_workbook("excel.xlsx".as_ref())?;
//!     ws.set_text("A1", "Hello")?;
//!     ws.set_formula("A2", "=LEN(A1)", "")?;
//!     ws.set_fill("A1", Rgb(200, 162, 200))?;
//!     println!("A2 = {}", ws.get_value("A2")?);
//!     ws.detach()?;
//!     bridge.shutdown()?;
//!     Ok(())
//! }
//! ```

mod bridge;
mod worksheet;

pub use bridge::{to_wine_path, Bridge, BridgeConfig, BridgeError};
pub use worksheet::Worksheet;
pub use xl_bridge_protocol::{CellValue, Rgb, SheetRef};

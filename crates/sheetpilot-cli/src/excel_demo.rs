//! Desktop flow: a fixed sequence of cell operations against a workbook
//! that is already open in a running Excel, with each result checked
//! against the expected literal.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use sheetpilot_excel::{Bridge, BridgeConfig, Rgb};

const LILAC: Rgb = Rgb(200, 162, 200);
const LIME_GREEN: Rgb = Rgb(127, 255, 0);

pub fn run(workbook: &Path, sheet: &str, config: BridgeConfig) -> Result<()> {
    println!("Running Excel demo");

    let bridge = Bridge::start(config).context("failed to start the Excel bridge")?;
    let mut ws = bridge.attach_workbook(workbook).with_context(|| {
        format!(
            "workbook '{}' is not open in the running application",
            workbook.display()
        )
    })?;
    ws.select_sheet_name(sheet);

    ws.clear_range("A1:A5")?;

    // text round-trip
    ws.set_text("A1", "Live Free or Die!")?;
    let motto = ws.get_value("A1")?;
    println!("A1 = {motto}");
    ensure!(
        motto.as_str() == Some("Live Free or Die!"),
        "A1 read back {motto}, expected the text that was written"
    );

    // formula over typed-in numerals; the read yields the computed value
    ws.set_text("A3", "1000")?;
    ws.set_text("A4", "2000")?;
    ws.set_formula("A5", "=SUM(A3:A4)", "0.00")?;
    bridge.recalculate()?;
    let total = ws.get_value("A5")?;
    println!("A5 = {total}");
    ensure!(
        total.as_f64() == Some(3000.0),
        "A5 read back {total}, expected 3000"
    );

    // fill colors round-trip exactly; a cleared fill is not any color
    ws.set_fill("A1", LILAC)?;
    ws.set_fill("A5", LIME_GREEN)?;
    let a1_fill = ws.get_fill("A1")?;
    let a5_fill = ws.get_fill("A5")?;
    println!("A1 fill = {a1_fill:?}, A5 fill = {a5_fill:?}");
    ensure!(a1_fill == Some(LILAC), "A1 fill read back {a1_fill:?}");
    ensure!(a5_fill == Some(LIME_GREEN), "A5 fill read back {a5_fill:?}");

    ws.clear_fill("A5")?;
    let cleared = ws.get_fill("A5")?;
    ensure!(
        cleared.is_none(),
        "A5 fill read back {cleared:?} after clearing, expected no fill"
    );

    ws.autofit_columns("A1")?;

    ws.detach()?;
    bridge.shutdown()?;

    println!("Excel demo passed");
    Ok(())
}

//! Flow-level checks for the product grid and its SUM margins, built the
//! same way the demo flow builds them.

use serde_json::json;
use sheetpilot_core::CellRange;
use sheetpilot_gsheets::{product_grid, write_column_sums, write_row_sums, CellBatch};

fn empty_batch(a1: &str) -> CellBatch {
    CellBatch::from_rows(CellRange::parse(a1).unwrap(), Vec::new())
}

#[test]
fn grid_and_margins_line_up() {
    let mut grid = empty_batch("A1:J10");
    product_grid(&mut grid);

    let mut column_sums = empty_batch("A12:J12");
    write_column_sums(&mut column_sums, 0, 9);

    let mut row_sums = empty_batch("L1:L10");
    write_row_sums(&mut row_sums, 0, 9);

    // every grid value is the product of its 1-based indices
    assert!(grid
        .cells()
        .all(|c| c.value == json!(c.row() as u64 * c.col() as u64)));

    // each column margin formula spans rows 1..10 of its own column
    for (cell, col) in column_sums.cells().zip("ABCDEFGHIJ".chars()) {
        assert_eq!(cell.value, json!(format!("=SUM({col}1,{col}10)")));
    }

    // each row margin formula spans columns A..J of its own row
    for (cell, row) in row_sums.cells().zip(1..=10) {
        assert_eq!(cell.value, json!(format!("=SUM(A{row},J{row})")));
    }

    // three flushes carry 100 + 10 + 10 cells
    assert_eq!(grid.to_matrix().concat().len(), 100);
    assert_eq!(column_sums.to_matrix().concat().len(), 10);
    assert_eq!(row_sums.to_matrix().concat().len(), 10);
}

#[test]
fn rerunning_after_a_clear_is_idempotent() {
    let mut first = empty_batch("A1:J10");
    product_grid(&mut first);

    // a fresh fetch after clearing the sheet yields another empty batch
    let mut second = empty_batch("A1:J10");
    product_grid(&mut second);

    assert_eq!(first.to_matrix(), second.to_matrix());
}

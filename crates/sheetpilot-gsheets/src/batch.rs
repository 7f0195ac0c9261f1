//! Local cell batches and the grid/formula builders of the demo flow.
//!
//! A batch is fetched once, mutated entirely in memory, and flushed once.

use serde_json::Value;
use sheetpilot_core::{CellAddress, CellRange};

/// One addressable cell of a fetched batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    addr: CellAddress,
    /// Local value; only [`update_cells`](crate::Worksheet::update_cells)
    /// sends it anywhere.
    pub value: Value,
}

impl Cell {
    pub fn addr(&self) -> CellAddress {
        self.addr
    }

    /// 1-based row index, as spreadsheet users count.
    pub fn row(&self) -> u32 {
        self.addr.row + 1
    }

    /// 1-based column index.
    pub fn col(&self) -> u32 {
        self.addr.col as u32 + 1
    }
}

/// A dense, row-major list of cells covering a rectangular range.
#[derive(Debug, Clone)]
pub struct CellBatch {
    range: CellRange,
    cells: Vec<Cell>,
}

impl CellBatch {
    /// Build a dense batch from fetched rows. The service omits trailing
    /// empty cells and rows; those are padded with empty strings so the
    /// batch always covers the whole rectangle.
    pub fn from_rows(range: CellRange, rows: Vec<Vec<Value>>) -> Self {
        let mut cells = Vec::with_capacity(range.cell_count() as usize);
        for addr in range.cells() {
            let r = (addr.row - range.start.row) as usize;
            let c = (addr.col - range.start.col) as usize;
            let value = rows
                .get(r)
                .and_then(|row| row.get(c))
                .cloned()
                .unwrap_or_else(|| Value::String(String::new()));
            cells.push(Cell { addr, value });
        }
        Self { range, cells }
    }

    pub fn range(&self) -> CellRange {
        self.range
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.cells.iter_mut()
    }

    /// The batch's values as a row-major 2-D matrix, shaped for a single
    /// flush call.
    pub fn to_matrix(&self) -> Vec<Vec<Value>> {
        self.cells
            .chunks(self.range.col_count() as usize)
            .map(|row| row.iter().map(|cell| cell.value.clone()).collect())
            .collect()
    }
}

/// Assign every cell of a batch the product of its 1-based row and column
/// indices.
pub fn product_grid(batch: &mut CellBatch) {
    for cell in batch.cells_mut() {
        cell.value = Value::from(cell.row() as u64 * cell.col() as u64);
    }
}

/// `=SUM(first,last)` with the two endpoint addresses passed as the two
/// arguments. The formula engine reads an address pair as the full range
/// spanned between them; the two-argument construction is kept as-is.
pub fn sum_formula(first: CellAddress, last: CellAddress) -> String {
    format!("=SUM({},{})", first.to_a1_string(), last.to_a1_string())
}

/// Give each cell of a batch a formula summing its own column between two
/// rows (0-based, inclusive).
pub fn write_column_sums(batch: &mut CellBatch, first_row: u32, last_row: u32) {
    for cell in batch.cells_mut() {
        let col = cell.addr().col;
        cell.value = Value::from(sum_formula(
            CellAddress::new(first_row, col),
            CellAddress::new(last_row, col),
        ));
    }
}

/// Give each cell of a batch a formula summing its own row between two
/// columns (0-based, inclusive).
pub fn write_row_sums(batch: &mut CellBatch, first_col: u16, last_col: u16) {
    for cell in batch.cells_mut() {
        let row = cell.addr().row;
        cell.value = Value::from(sum_formula(
            CellAddress::new(row, first_col),
            CellAddress::new(row, last_col),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn batch(a1: &str) -> CellBatch {
        CellBatch::from_rows(CellRange::parse(a1).unwrap(), Vec::new())
    }

    #[test]
    fn fetch_padding_covers_the_rectangle() {
        let rows = vec![
            vec![json!("x"), json!(2)],
            vec![json!("y")], // short row: B2 missing
        ];
        let batch = CellBatch::from_rows(CellRange::parse("A1:B3").unwrap(), rows);

        assert_eq!(batch.len(), 6);
        let values: Vec<Value> = batch.cells().map(|c| c.value.clone()).collect();
        assert_eq!(
            values,
            [json!("x"), json!(2), json!("y"), json!(""), json!(""), json!("")]
        );
        // addresses stay aligned with the sheet, not the fetched data
        let last = batch.cells().last().unwrap();
        assert_eq!(last.addr().to_a1_string(), "B3");
    }

    #[test]
    fn product_grid_is_row_times_col() {
        let mut grid = batch("A1:J10");
        product_grid(&mut grid);

        assert_eq!(grid.len(), 100);
        for cell in grid.cells() {
            assert_eq!(
                cell.value,
                json!(cell.row() as u64 * cell.col() as u64),
                "wrong product at {}",
                cell.addr()
            );
        }

        // rerunning produces the identical batch
        let mut again = batch("A1:J10");
        product_grid(&mut again);
        assert_eq!(grid.to_matrix(), again.to_matrix());
    }

    #[test]
    fn sum_formula_keeps_both_endpoints_as_arguments() {
        let formula = sum_formula(
            CellAddress::parse("A1").unwrap(),
            CellAddress::parse("A10").unwrap(),
        );
        assert_eq!(formula, "=SUM(A1,A10)");
    }

    #[test]
    fn column_sums_reference_their_own_column() {
        // margin row below a 10x10 grid
        let mut sums = batch("A12:J12");
        write_column_sums(&mut sums, 0, 9);

        assert_eq!(sums.len(), 10);
        for cell in sums.cells() {
            let letters = CellAddress::column_to_letters(cell.addr().col);
            let expected = format!("=SUM({letters}1,{letters}10)");
            assert_eq!(cell.value, json!(expected));
        }
    }

    #[test]
    fn row_sums_reference_their_own_row() {
        // margin column right of a 10x10 grid
        let mut sums = batch("L1:L10");
        write_row_sums(&mut sums, 0, 9);

        assert_eq!(sums.len(), 10);
        for cell in sums.cells() {
            let row = cell.row();
            let expected = format!("=SUM(A{row},J{row})");
            assert_eq!(cell.value, json!(expected));
        }
    }

    #[test]
    fn matrix_shape_matches_the_range() {
        let mut grid = batch("A1:C2");
        product_grid(&mut grid);
        let matrix = grid.to_matrix();
        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix[0], vec![json!(1), json!(2), json!(3)]);
        assert_eq!(matrix[1], vec![json!(2), json!(4), json!(6)]);
    }
}

//! Worksheet handle - the cell operation set, forwarded to the bridge.

use sheetpilot_core::{CellAddress, CellRange};
use xl_bridge_protocol::{CellValue, Command, Rgb, ResponseData, SheetRef};

use crate::bridge::{Bridge, BridgeError};

/// A worksheet inside a workbook the bridge has attached to.
///
/// Operations target one sheet at a time; the default is the sheet at
/// index 0. Every range string is validated locally before any I/O, so a
/// syntactically invalid address never reaches the bridge.
pub struct Worksheet<'a> {
    bridge: &'a Bridge,
    workbook: u64,
    sheet: SheetRef,
}

impl<'a> Worksheet<'a> {
    pub(crate) fn new(bridge: &'a Bridge, workbook: u64) -> Self {
        Self {
            bridge,
            workbook,
            sheet: SheetRef::Index(0),
        }
    }

    /// The bridge-internal workbook handle.
    pub fn handle(&self) -> u64 {
        self.workbook
    }

    /// Target a sheet by 0-based index.
    pub fn select_sheet_index(&mut self, index: u32) {
        self.sheet = SheetRef::Index(index);
    }

    /// Target a sheet by name.
    pub fn select_sheet_name(&mut self, name: impl Into<String>) {
        self.sheet = SheetRef::Name(name.into());
    }

    /// Clear contents, formats, and fill of a range.
    pub fn clear_range(&self, range: &str) -> Result<(), BridgeError> {
        checked_range(range)?;
        self.bridge.send_command(Command::ClearRange {
            workbook: self.workbook,
            sheet: self.sheet.clone(),
            range: range.to_string(),
        })?;
        Ok(())
    }

    /// Write a literal text value into a range.
    ///
    /// The application applies its usual type-on-entry coercion, so `"1000"`
    /// lands as the number 1000, exactly as if typed into the cell.
    pub fn set_text(&self, range: &str, text: &str) -> Result<(), BridgeError> {
        self.set_value(range, text)
    }

    /// Write a value into a range.
    ///
    /// Accepts anything that converts to [`CellValue`]: `&str`/`String`,
    /// `f64`/`i32`/`i64`, `bool`.
    pub fn set_value(&self, range: &str, value: impl Into<CellValue>) -> Result<(), BridgeError> {
        checked_range(range)?;
        self.bridge.send_command(Command::SetValue {
            workbook: self.workbook,
            sheet: self.sheet.clone(),
            range: range.to_string(),
            value: value.into(),
        })?;
        Ok(())
    }

    /// Write a formula (e.g. `=SUM(A3:A4)`) into a cell and set its display
    /// format in the same step. An empty format string leaves the cell's
    /// default display.
    pub fn set_formula(
        &self,
        cell: &str,
        formula: &str,
        number_format: &str,
    ) -> Result<(), BridgeError> {
        checked_cell(cell)?;
        self.bridge.send_command(Command::SetFormula {
            workbook: self.workbook,
            sheet: self.sheet.clone(),
            cell: cell.to_string(),
            formula: formula.to_string(),
            number_format: number_format.to_string(),
        })?;
        Ok(())
    }

    /// Read a cell's computed value as interpreted by the application.
    ///
    /// A formula cell yields its calculated result, never the formula
    /// string.
    pub fn get_value(&self, cell: &str) -> Result<CellValue, BridgeError> {
        checked_cell(cell)?;
        let data = self.bridge.send_command(Command::GetValue {
            workbook: self.workbook,
            sheet: self.sheet.clone(),
            cell: cell.to_string(),
        })?;
        match data {
            Some(ResponseData::Value { value }) => Ok(value),
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    /// Fill a range with an RGB color.
    pub fn set_fill(&self, range: &str, color: Rgb) -> Result<(), BridgeError> {
        checked_range(range)?;
        self.bridge.send_command(Command::SetFill {
            workbook: self.workbook,
            sheet: self.sheet.clone(),
            range: range.to_string(),
            color,
        })?;
        Ok(())
    }

    /// Reset a range's fill to "no fill", observably distinct from any
    /// explicit color.
    pub fn clear_fill(&self, range: &str) -> Result<(), BridgeError> {
        checked_range(range)?;
        self.bridge.send_command(Command::ClearFill {
            workbook: self.workbook,
            sheet: self.sheet.clone(),
            range: range.to_string(),
        })?;
        Ok(())
    }

    /// Read a cell's fill color; `None` means no fill.
    pub fn get_fill(&self, cell: &str) -> Result<Option<Rgb>, BridgeError> {
        checked_cell(cell)?;
        let data = self.bridge.send_command(Command::GetFill {
            workbook: self.workbook,
            sheet: self.sheet.clone(),
            cell: cell.to_string(),
        })?;
        match data {
            Some(ResponseData::Fill { color }) => Ok(color),
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    /// Resize the columns containing a range to fit their content.
    /// Cosmetic only; not observable through [`Worksheet::get_value`].
    pub fn autofit_columns(&self, range: &str) -> Result<(), BridgeError> {
        checked_range(range)?;
        self.bridge.send_command(Command::AutofitColumns {
            workbook: self.workbook,
            sheet: self.sheet.clone(),
            range: range.to_string(),
        })?;
        Ok(())
    }

    /// Release the workbook handle. The document stays open in the
    /// application; nothing is saved or closed.
    pub fn detach(self) -> Result<(), BridgeError> {
        self.bridge.send_command(Command::DetachWorkbook {
            workbook: self.workbook,
        })?;
        Ok(())
    }
}

fn checked_range(range: &str) -> Result<(), BridgeError> {
    CellRange::parse(range)?;
    Ok(())
}

fn checked_cell(cell: &str) -> Result<(), BridgeError> {
    CellAddress::parse(cell)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_strings_are_validated_before_any_io() {
        assert!(checked_range("A1:A5").is_ok());
        assert!(checked_range("A1").is_ok());
        assert!(matches!(
            checked_range("not a range"),
            Err(BridgeError::InvalidRange(_))
        ));

        assert!(checked_cell("A5").is_ok());
        assert!(checked_cell("A1:A5").is_err());
        assert!(checked_cell("").is_err());
    }
}

//! Excel automation layer: attach to the running application and mutate
//! cells in already-open workbooks.

#![cfg(windows)]

use std::collections::HashMap;

use xl_bridge_protocol::{CellError, CellValue, Rgb, SheetRef};

use crate::com::{Automation, Variant};

/// `Interior.ColorIndex` value meaning "no fill" (xlColorIndexNone).
const XL_COLOR_INDEX_NONE: i32 = -4142;

/// The running Excel.Application instance and the workbooks we have attached
/// to. The application is externally owned: nothing here creates, saves,
/// closes, or quits anything.
pub struct ExcelApp {
    app: Automation,
    workbooks_collection: Automation,
    /// Map from our handle IDs to workbook automation objects.
    workbooks: HashMap<u64, Automation>,
    next_handle: u64,
}

impl ExcelApp {
    /// Attach to the running Excel.Application instance.
    pub fn attach() -> Result<Self, String> {
        let app = Automation::live_instance("Excel.Application")
            .map_err(|e| format!("Excel is not running: {e}"))?;
        let workbooks_collection = app.object("Workbooks")?;

        Ok(Self {
            app,
            workbooks_collection,
            workbooks: HashMap::new(),
            next_handle: 1,
        })
    }

    /// Attach to an open workbook by path. Matches on the workbook's full
    /// path first, then on its bare file name. Returns the handle ID.
    pub fn attach_workbook(&mut self, path: &str) -> Result<u64, String> {
        let wanted_full = path.to_ascii_lowercase();
        let wanted_name = path
            .rsplit(['\\', '/'])
            .next()
            .unwrap_or(path)
            .to_ascii_lowercase();

        let count = self
            .workbooks_collection
            .prop("Count")?
            .as_f64()
            .unwrap_or(0.0) as i32;

        // Workbooks collection is 1-based
        for i in 1..=count {
            let wb = self
                .workbooks_collection
                .indexed("Item", Variant::from_i32(i))?;
            let full_name = wb.prop("FullName")?.as_string().unwrap_or_default();
            let name = wb.prop("Name")?.as_string().unwrap_or_default();

            if full_name.to_ascii_lowercase() == wanted_full
                || name.to_ascii_lowercase() == wanted_name
            {
                let handle = self.next_handle;
                self.next_handle += 1;
                self.workbooks.insert(handle, wb);
                return Ok(handle);
            }
        }

        Err(format!(
            "no open workbook matches '{path}' ({count} workbook(s) open)"
        ))
    }

    /// Release a workbook handle. The document stays open in the application.
    pub fn detach_workbook(&mut self, handle: u64) -> Result<(), String> {
        self.workbooks
            .remove(&handle)
            .map(|_| ())
            .ok_or_else(|| format!("Unknown workbook handle: {handle}"))
    }

    fn get_sheet(&self, wb_handle: u64, sheet: &SheetRef) -> Result<Automation, String> {
        let wb = self
            .workbooks
            .get(&wb_handle)
            .ok_or_else(|| format!("Unknown workbook handle: {wb_handle}"))?;

        let sheets = wb.object("Worksheets")?;
        match sheet {
            SheetRef::Index(idx) => {
                // Excel worksheets are 1-based, the protocol uses 0-based
                let excel_index = (*idx as i32) + 1;
                sheets.indexed("Item", Variant::from_i32(excel_index))
            }
            SheetRef::Name(name) => sheets.indexed("Item", Variant::bstr(name)),
        }
    }

    fn get_range(
        &self,
        wb_handle: u64,
        sheet: &SheetRef,
        range_ref: &str,
    ) -> Result<Automation, String> {
        let ws = self.get_sheet(wb_handle, sheet)?;
        ws.indexed("Range", Variant::bstr(range_ref))
    }

    /// Clear contents, formats, and fill of a range.
    pub fn clear_range(
        &self,
        wb_handle: u64,
        sheet: &SheetRef,
        range_ref: &str,
    ) -> Result<(), String> {
        self.get_range(wb_handle, sheet, range_ref)?.call("Clear")
    }

    /// Write a value; Excel applies its type-on-entry coercion.
    pub fn set_value(
        &self,
        wb_handle: u64,
        sheet: &SheetRef,
        range_ref: &str,
        value: &CellValue,
    ) -> Result<(), String> {
        let range = self.get_range(wb_handle, sheet, range_ref)?;
        range.put("Value", cell_value_to_variant(value))
    }

    /// Write a formula and, if non-empty, a number format.
    pub fn set_formula(
        &self,
        wb_handle: u64,
        sheet: &SheetRef,
        cell_ref: &str,
        formula: &str,
        number_format: &str,
    ) -> Result<(), String> {
        let range = self.get_range(wb_handle, sheet, cell_ref)?;
        range.put("Formula", Variant::bstr(formula))?;
        if !number_format.is_empty() {
            range.put("NumberFormat", Variant::bstr(number_format))?;
        }
        Ok(())
    }

    /// Read a cell's computed value.
    pub fn get_value(
        &self,
        wb_handle: u64,
        sheet: &SheetRef,
        cell_ref: &str,
    ) -> Result<CellValue, String> {
        let value = self.get_range(wb_handle, sheet, cell_ref)?.prop("Value")?;
        Ok(variant_to_cell_value(&value))
    }

    /// Fill a range with an RGB color.
    pub fn set_fill(
        &self,
        wb_handle: u64,
        sheet: &SheetRef,
        range_ref: &str,
        color: Rgb,
    ) -> Result<(), String> {
        let interior = self.get_range(wb_handle, sheet, range_ref)?.object("Interior")?;
        interior.put("Color", Variant::from_i32(rgb_to_com(color)))
    }

    /// Reset a range's fill to "no fill".
    pub fn clear_fill(
        &self,
        wb_handle: u64,
        sheet: &SheetRef,
        range_ref: &str,
    ) -> Result<(), String> {
        let interior = self.get_range(wb_handle, sheet, range_ref)?.object("Interior")?;
        interior.put("ColorIndex", Variant::from_i32(XL_COLOR_INDEX_NONE))
    }

    /// Read a cell's fill color; `None` for no fill.
    pub fn get_fill(
        &self,
        wb_handle: u64,
        sheet: &SheetRef,
        cell_ref: &str,
    ) -> Result<Option<Rgb>, String> {
        let interior = self.get_range(wb_handle, sheet, cell_ref)?.object("Interior")?;

        if let Some(idx) = interior.prop("ColorIndex")?.as_f64() {
            if idx as i32 == XL_COLOR_INDEX_NONE {
                return Ok(None);
            }
        }

        let raw = interior
            .prop("Color")?
            .as_f64()
            .ok_or_else(|| "Interior.Color returned a non-numeric value".to_string())?;
        Ok(Some(com_to_rgb(raw as u32)))
    }

    /// Resize the columns containing a range to fit their content.
    pub fn autofit_columns(
        &self,
        wb_handle: u64,
        sheet: &SheetRef,
        range_ref: &str,
    ) -> Result<(), String> {
        self.get_range(wb_handle, sheet, range_ref)?
            .object("EntireColumn")?
            .call("AutoFit")
    }

    /// Force a full recalculation.
    pub fn recalculate(&self) -> Result<(), String> {
        self.app.call("Calculate")
    }

    /// Release all handles. The application and its documents are untouched.
    pub fn shutdown(mut self) -> Result<(), String> {
        self.workbooks.clear();
        Ok(())
    }
}

/// OLE colors are BGR-packed longs.
fn rgb_to_com(color: Rgb) -> i32 {
    let Rgb(r, g, b) = color;
    (r as i32) | ((g as i32) << 8) | ((b as i32) << 16)
}

fn com_to_rgb(raw: u32) -> Rgb {
    Rgb((raw & 0xFF) as u8, ((raw >> 8) & 0xFF) as u8, ((raw >> 16) & 0xFF) as u8)
}

/// Convert a protocol CellValue to a COM value.
fn cell_value_to_variant(value: &CellValue) -> Variant {
    match value {
        CellValue::Null => Variant::empty(),
        CellValue::Bool(b) => Variant::from_bool(*b),
        CellValue::Number(n) => Variant::from_f64(*n),
        CellValue::String(s) => Variant::bstr(s),
        CellValue::Error(_) => Variant::empty(), // error values cannot be written
    }
}

/// Convert a COM value to a protocol CellValue.
fn variant_to_cell_value(variant: &Variant) -> CellValue {
    if variant.is_empty() {
        CellValue::Null
    } else if let Some(b) = variant.as_bool() {
        CellValue::Bool(b)
    } else if let Some(n) = variant.as_f64() {
        CellValue::Number(n)
    } else if let Some(s) = variant.as_string() {
        CellValue::String(s)
    } else if variant.is_com_error() {
        CellValue::Error(CellError {
            code: "#ERR(VT_ERROR)".to_string(),
        })
    } else {
        CellValue::Null
    }
}

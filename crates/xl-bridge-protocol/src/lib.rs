//! Wire types shared by the native sheetpilot client and the Windows bridge
//! process that automates a running Excel instance.
//!
//! The protocol is JSON-over-stdio: one JSON object per line in each
//! direction. This crate stays dependency-light because it is compiled both
//! natively and for the `x86_64-pc-windows-gnu` bridge target.

use serde::{Deserialize, Serialize};

/// A command sent from the client to the bridge process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Monotonically increasing request ID for correlating responses.
    pub id: u64,
    #[serde(flatten)]
    pub command: Command,
}

/// Commands the client can send to the bridge.
///
/// The bridge never creates, saves, or closes documents: it attaches to a
/// workbook that is already open in the running application and mutates
/// cells in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "params")]
pub enum Command {
    /// Initialize COM and connect to the running Excel.Application instance.
    Init,

    /// Attach to an open workbook by file name (Windows path as seen by the
    /// application). Fails if no open workbook matches. Returns a handle.
    AttachWorkbook { path: String },

    /// Release a workbook handle without closing the document.
    DetachWorkbook { workbook: u64 },

    /// Clear contents, formats, and fill of a range.
    ClearRange {
        workbook: u64,
        sheet: SheetRef,
        range: String,
    },

    /// Write a literal value into a range. The application applies its usual
    /// type-on-entry coercion, exactly as if the value had been typed in.
    SetValue {
        workbook: u64,
        sheet: SheetRef,
        range: String,
        value: CellValue,
    },

    /// Write a formula into a cell, optionally setting its display format
    /// (empty string leaves the default display).
    SetFormula {
        workbook: u64,
        sheet: SheetRef,
        cell: String,
        formula: String,
        number_format: String,
    },

    /// Read a cell's computed value (never the formula string).
    GetValue {
        workbook: u64,
        sheet: SheetRef,
        cell: String,
    },

    /// Set the fill color of a range.
    SetFill {
        workbook: u64,
        sheet: SheetRef,
        range: String,
        color: Rgb,
    },

    /// Reset a range's fill to "no fill".
    ClearFill {
        workbook: u64,
        sheet: SheetRef,
        range: String,
    },

    /// Read a cell's fill color; `None` means no fill.
    GetFill {
        workbook: u64,
        sheet: SheetRef,
        cell: String,
    },

    /// Resize the columns containing a range to fit their content.
    AutofitColumns {
        workbook: u64,
        sheet: SheetRef,
        range: String,
    },

    /// Force a full recalculation of all open workbooks.
    Recalculate,

    /// Shut down the bridge: release all handles, leave the application and
    /// its documents as they are, uninitialize COM.
    Shutdown,
}

/// Reference to a worksheet, by 0-based index or by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetRef {
    Index(u32),
    Name(String),
}

/// A cell value as produced or consumed by the host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Error(CellError),
}

/// An error value such as `#REF!` read out of a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellError {
    pub code: String,
}

/// An RGB fill color, serialized as a 3-element array `[r, g, b]`.
///
/// "No fill" is represented as `Option<Rgb>::None` on the wire and is
/// distinct from every triplet, including black.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// A response sent from the bridge back to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// The request ID this response corresponds to.
    pub id: u64,
    #[serde(flatten)]
    pub result: ResponseResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ResponseResult {
    #[serde(rename = "ok")]
    Ok {
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<ResponseData>,
    },
    #[serde(rename = "error")]
    Error { message: String },
}

/// Data carried in successful responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    /// Handle to a workbook the bridge attached to.
    WorkbookHandle { workbook: u64 },
    /// A computed cell value.
    Value { value: CellValue },
    /// A fill color; `color` is null for "no fill".
    Fill { color: Option<Rgb> },
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<f32> for CellValue {
    fn from(n: f32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Null => write!(f, "<empty>"),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Error(e) => write!(f, "{}", e.code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_wire_shape() {
        let req = Request {
            id: 7,
            command: Command::SetFormula {
                workbook: 1,
                sheet: SheetRef::Name("Sheet1".into()),
                cell: "A5".into(),
                formula: "=SUM(A3:A4)".into(),
                number_format: "0.00".into(),
            },
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "id": 7,
                "cmd": "SetFormula",
                "params": {
                    "workbook": 1,
                    "sheet": "Sheet1",
                    "cell": "A5",
                    "formula": "=SUM(A3:A4)",
                    "number_format": "0.00",
                }
            })
        );
    }

    #[test]
    fn rgb_is_a_three_element_array() {
        let req = Request {
            id: 1,
            command: Command::SetFill {
                workbook: 1,
                sheet: SheetRef::Index(0),
                range: "A1".into(),
                color: Rgb(200, 162, 200),
            },
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["params"]["color"], json!([200, 162, 200]));
        assert_eq!(value["params"]["sheet"], json!(0));
    }

    #[test]
    fn no_fill_is_null_not_black() {
        let none = Response {
            id: 3,
            result: ResponseResult::Ok {
                data: Some(ResponseData::Fill { color: None }),
            },
        };
        let value = serde_json::to_value(&none).unwrap();
        assert_eq!(value, json!({"id": 3, "status": "ok", "data": {"color": null}}));

        let black: Response =
            serde_json::from_value(json!({"id": 4, "status": "ok", "data": {"color": [0, 0, 0]}}))
                .unwrap();
        match black.result {
            ResponseResult::Ok {
                data: Some(ResponseData::Fill { color }),
            } => assert_eq!(color, Some(Rgb(0, 0, 0))),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn value_responses_round_trip() {
        for (value, wire) in [
            (CellValue::Null, json!(null)),
            (CellValue::Number(3000.0), json!(3000.0)),
            (CellValue::String("Live Free or Die!".into()), json!("Live Free or Die!")),
            (CellValue::Bool(true), json!(true)),
        ] {
            let resp = Response {
                id: 9,
                result: ResponseResult::Ok {
                    data: Some(ResponseData::Value {
                        value: value.clone(),
                    }),
                },
            };
            let encoded = serde_json::to_value(&resp).unwrap();
            assert_eq!(encoded["data"]["value"], wire);
            let decoded: Response = serde_json::from_value(encoded).unwrap();
            match decoded.result {
                ResponseResult::Ok {
                    data: Some(ResponseData::Value { value: got }),
                } => assert_eq!(got, value),
                other => panic!("unexpected response: {other:?}"),
            }
        }
    }

    #[test]
    fn error_response_parses() {
        let resp: Response = serde_json::from_str(
            r#"{"id":2,"status":"error","message":"no open workbook matches 'excel.xlsx'"}"#,
        )
        .unwrap();
        match resp.result {
            ResponseResult::Error { message } => {
                assert!(message.contains("excel.xlsx"));
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }
}

//! xl-bridge - a Windows process that drives a RUNNING Excel instance via
//! COM, controlled by JSON commands over stdin/stdout.
//!
//! Designed to be cross-compiled from Linux and run under WINE next to an
//! open Excel. It never creates, saves, closes, or quits anything; it
//! attaches to workbooks the user already has open and mutates cells.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! - Reads `Request` objects from stdin
//! - Writes `Response` objects to stdout
//! - Diagnostic messages go to stderr (never stdout)

#[cfg(windows)]
mod com;
#[cfg(windows)]
mod excel;

#[cfg(not(windows))]
fn main() {
    eprintln!("xl-bridge must be compiled for Windows (--target x86_64-pc-windows-gnu)");
    eprintln!("and run under WINE on Linux.");
    std::process::exit(1);
}

#[cfg(windows)]
fn main() {
    use std::io::{self, BufRead, Write};

    use xl_bridge_protocol::*;

    eprintln!("[xl-bridge] Starting up...");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut excel: Option<excel::ExcelApp> = None;

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("[xl-bridge] stdin read error: {e}");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let request: Request = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("[xl-bridge] JSON parse error: {e}");
                eprintln!("[xl-bridge] Line was: {line}");
                // id=0 because the request could not be parsed
                let resp = Response {
                    id: 0,
                    result: ResponseResult::Error {
                        message: format!("JSON parse error: {e}"),
                    },
                };
                let _ = writeln!(out, "{}", serde_json::to_string(&resp).unwrap());
                let _ = out.flush();
                continue;
            }
        };

        let response = handle_command(&mut excel, &request);
        let json = serde_json::to_string(&response).unwrap();
        let _ = writeln!(out, "{json}");
        let _ = out.flush();

        if matches!(request.command, Command::Shutdown)
            && matches!(response.result, ResponseResult::Ok { .. })
        {
            eprintln!("[xl-bridge] Shutdown complete, exiting.");
            break;
        }
    }

    // Release any handles still held when stdin closes
    if let Some(app) = excel {
        eprintln!("[xl-bridge] stdin closed, releasing handles...");
        let _ = app.shutdown();
    }

    eprintln!("[xl-bridge] Process exiting.");
}

#[cfg(windows)]
fn handle_command(
    excel: &mut Option<excel::ExcelApp>,
    request: &xl_bridge_protocol::Request,
) -> xl_bridge_protocol::Response {
    use xl_bridge_protocol::*;

    let id = request.id;

    let result = match &request.command {
        Command::Init => init_com_and_attach(excel),
        Command::AttachWorkbook { path } => with_excel(excel, |app| {
            let handle = app.attach_workbook(path)?;
            Ok(ResponseResult::Ok {
                data: Some(ResponseData::WorkbookHandle { workbook: handle }),
            })
        }),
        Command::DetachWorkbook { workbook } => with_excel(excel, |app| {
            app.detach_workbook(*workbook)?;
            Ok(ResponseResult::Ok { data: None })
        }),
        Command::ClearRange {
            workbook,
            sheet,
            range,
        } => with_excel(excel, |app| {
            app.clear_range(*workbook, sheet, range)?;
            Ok(ResponseResult::Ok { data: None })
        }),
        Command::SetValue {
            workbook,
            sheet,
            range,
            value,
        } => with_excel(excel, |app| {
            app.set_value(*workbook, sheet, range, value)?;
            Ok(ResponseResult::Ok { data: None })
        }),
        Command::SetFormula {
            workbook,
            sheet,
            cell,
            formula,
            number_format,
        } => with_excel(excel, |app| {
            app.set_formula(*workbook, sheet, cell, formula, number_format)?;
            Ok(ResponseResult::Ok { data: None })
        }),
        Command::GetValue {
            workbook,
            sheet,
            cell,
        } => with_excel(excel, |app| {
            let value = app.get_value(*workbook, sheet, cell)?;
            Ok(ResponseResult::Ok {
                data: Some(ResponseData::Value { value }),
            })
        }),
        Command::SetFill {
            workbook,
            sheet,
            range,
            color,
        } => with_excel(excel, |app| {
            app.set_fill(*workbook, sheet, range, *color)?;
            Ok(ResponseResult::Ok { data: None })
        }),
        Command::ClearFill {
            workbook,
            sheet,
            range,
        } => with_excel(excel, |app| {
            app.clear_fill(*workbook, sheet, range)?;
            Ok(ResponseResult::Ok { data: None })
        }),
        Command::GetFill {
            workbook,
            sheet,
            cell,
        } => with_excel(excel, |app| {
            let color = app.get_fill(*workbook, sheet, cell)?;
            Ok(ResponseResult::Ok {
                data: Some(ResponseData::Fill { color }),
            })
        }),
        Command::AutofitColumns {
            workbook,
            sheet,
            range,
        } => with_excel(excel, |app| {
            app.autofit_columns(*workbook, sheet, range)?;
            Ok(ResponseResult::Ok { data: None })
        }),
        Command::Recalculate => with_excel(excel, |app| {
            app.recalculate()?;
            Ok(ResponseResult::Ok { data: None })
        }),
        Command::Shutdown => match excel.take() {
            Some(app) => match app.shutdown() {
                Ok(()) => {
                    uninit_com();
                    ResponseResult::Ok { data: None }
                }
                Err(e) => ResponseResult::Error {
                    message: format!("Shutdown failed: {e}"),
                },
            },
            None => ResponseResult::Ok { data: None },
        },
    };

    Response { id, result }
}

#[cfg(windows)]
fn init_com_and_attach(excel: &mut Option<excel::ExcelApp>) -> xl_bridge_protocol::ResponseResult {
    use windows::Win32::System::Com::{CoInitializeEx, COINIT_APARTMENTTHREADED};
    use xl_bridge_protocol::ResponseResult;

    if excel.is_some() {
        return ResponseResult::Ok { data: None }; // already attached
    }

    // Excel requires Single-Threaded Apartment mode
    unsafe {
        let hr = CoInitializeEx(None, COINIT_APARTMENTTHREADED);
        if let Err(e) = hr.ok() {
            return ResponseResult::Error {
                message: format!("CoInitializeEx failed: {e}"),
            };
        }
    }

    eprintln!("[xl-bridge] COM initialized (STA)");

    match excel::ExcelApp::attach() {
        Ok(app) => {
            eprintln!("[xl-bridge] Attached to running Excel.Application");
            *excel = Some(app);
            ResponseResult::Ok { data: None }
        }
        Err(e) => ResponseResult::Error { message: e },
    }
}

#[cfg(windows)]
fn uninit_com() {
    unsafe {
        windows::Win32::System::Com::CoUninitialize();
    }
    eprintln!("[xl-bridge] COM uninitialized");
}

#[cfg(windows)]
fn with_excel(
    excel: &mut Option<excel::ExcelApp>,
    f: impl FnOnce(&mut excel::ExcelApp) -> Result<xl_bridge_protocol::ResponseResult, String>,
) -> xl_bridge_protocol::ResponseResult {
    match excel.as_mut() {
        Some(app) => match f(app) {
            Ok(r) => r,
            Err(e) => xl_bridge_protocol::ResponseResult::Error { message: e },
        },
        None => xl_bridge_protocol::ResponseResult::Error {
            message: "Not attached. Send 'Init' first.".to_string(),
        },
    }
}

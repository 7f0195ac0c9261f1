//! Subprocess management and JSON IPC for the WINE bridge process.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use xl_bridge_protocol::{Command as BridgeCommand, Request, Response, ResponseData, ResponseResult};

use crate::worksheet::Worksheet;

/// Errors from the Excel bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Failed to spawn WINE bridge process: {0}")]
    SpawnFailed(#[from] std::io::Error),

    #[error("Bridge process not running")]
    NotRunning,

    #[error("Failed to send command to bridge: {0}")]
    SendFailed(String),

    #[error("Failed to read response from bridge: {0}")]
    ReadFailed(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Bridge returned error: {0}")]
    Bridge(String),

    #[error("Unexpected response data")]
    UnexpectedResponse,

    #[error("WINE not found. Install WINE and ensure 'wine' is in PATH.")]
    WineNotFound,

    #[error("Bridge executable not found at: {0}")]
    BridgeExeNotFound(String),

    #[error("Invalid range: {0}")]
    InvalidRange(#[from] sheetpilot_core::Error),
}

/// Configuration for the Excel bridge.
pub struct BridgeConfig {
    /// Path to the `xl-bridge.exe` Windows executable.
    /// If None, searches common locations relative to the current binary.
    pub bridge_exe_path: Option<PathBuf>,

    /// Path to the WINE executable. Defaults to "wine".
    pub wine_path: PathBuf,

    /// Optional WINEPREFIX to use (for isolating the WINE environment).
    pub wine_prefix: Option<PathBuf>,

    /// Timeout for waiting for bridge responses.
    pub timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bridge_exe_path: None,
            wine_path: PathBuf::from("wine"),
            wine_prefix: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// The main handle for communicating with the Excel bridge.
///
/// Manages the WINE subprocess lifecycle and carries the raw command
/// plumbing; cell operations live on [`Worksheet`].
pub struct Bridge {
    child: Mutex<Child>,
    stdin: Mutex<std::process::ChildStdin>,
    stdout: Mutex<BufReader<std::process::ChildStdout>>,
    next_id: AtomicU64,
}

impl Bridge {
    /// Start the bridge process and connect it to the running application.
    pub fn start(config: BridgeConfig) -> Result<Self, BridgeError> {
        let exe_path = config.bridge_exe_path.unwrap_or_else(find_bridge_exe);

        if !exe_path.exists() {
            return Err(BridgeError::BridgeExeNotFound(
                exe_path.display().to_string(),
            ));
        }

        let mut cmd = std::process::Command::new(&config.wine_path);

        if let Some(prefix) = &config.wine_prefix {
            cmd.env("WINEPREFIX", prefix);
        }

        cmd.arg(&exe_path);
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::inherit()); // Bridge diagnostics go to our stderr

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BridgeError::WineNotFound
            } else {
                BridgeError::SpawnFailed(e)
            }
        })?;

        let stdin = child.stdin.take().expect("stdin was piped");
        let stdout = child.stdout.take().expect("stdout was piped");

        let bridge = Self {
            child: Mutex::new(child),
            stdin: Mutex::new(stdin),
            stdout: Mutex::new(BufReader::new(stdout)),
            next_id: AtomicU64::new(1),
        };

        // Connect to the live Excel.Application instance
        bridge.send_command(BridgeCommand::Init)?;

        Ok(bridge)
    }

    /// Send a command to the bridge and wait for the response.
    pub(crate) fn send_command(
        &self,
        command: BridgeCommand,
    ) -> Result<Option<ResponseData>, BridgeError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let request = Request { id, command };
        let json = serde_json::to_string(&request)?;

        {
            let mut stdin = self.stdin.lock().unwrap();
            writeln!(stdin, "{json}").map_err(|e| BridgeError::SendFailed(e.to_string()))?;
            stdin
                .flush()
                .map_err(|e| BridgeError::SendFailed(e.to_string()))?;
        }

        let response: Response = {
            let mut stdout = self.stdout.lock().unwrap();
            let mut line = String::new();
            stdout
                .read_line(&mut line)
                .map_err(|e| BridgeError::ReadFailed(e.to_string()))?;

            if line.is_empty() {
                return Err(BridgeError::NotRunning);
            }

            serde_json::from_str(&line)?
        };

        match response.result {
            ResponseResult::Ok { data } => Ok(data),
            ResponseResult::Error { message } => Err(BridgeError::Bridge(message)),
        }
    }

    /// Attach to a workbook that is already open in the running application.
    ///
    /// The path is a Linux path; it is converted to the WINE view of the
    /// filesystem before being matched against the application's open
    /// documents. Fails with a bridge error naming the path if no open
    /// workbook matches - the target document is an explicit input, not
    /// whatever happens to be frontmost.
    pub fn attach_workbook(&self, path: &Path) -> Result<Worksheet<'_>, BridgeError> {
        let data = self.send_command(BridgeCommand::AttachWorkbook {
            path: to_wine_path(path),
        })?;
        match data {
            Some(ResponseData::WorkbookHandle { workbook }) => Ok(Worksheet::new(self, workbook)),
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    /// Force the application to recalculate all open workbooks.
    pub fn recalculate(&self) -> Result<(), BridgeError> {
        self.send_command(BridgeCommand::Recalculate)?;
        Ok(())
    }

    /// Shut down the bridge process. The application and its documents are
    /// left untouched.
    pub fn shutdown(self) -> Result<(), BridgeError> {
        let _ = self.send_command(BridgeCommand::Shutdown);

        let mut child = self.child.lock().unwrap();
        let _ = child.wait();

        Ok(())
    }
}

/// Convert a Linux filesystem path to the WINE (Windows) view of it.
///
/// WINE maps `/` to `Z:\`, so `/home/user/excel.xlsx` becomes
/// `Z:\home\user\excel.xlsx`. Relative paths are resolved against the
/// current directory first.
pub fn to_wine_path(path: &Path) -> String {
    let abs = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    };

    format!("Z:{}", abs.display()).replace('/', "\\")
}

/// Locate the bridge exe next to the current executable or in the
/// cross-compilation target directory.
fn find_bridge_exe() -> PathBuf {
    if let Ok(mut exe) = std::env::current_exe() {
        exe.pop();
        let candidate = exe.join("xl-bridge.exe");
        if candidate.exists() {
            return candidate;
        }
    }

    for profile in ["release", "debug"] {
        let candidate =
            PathBuf::from(format!("target/x86_64-pc-windows-gnu/{profile}/xl-bridge.exe"));
        if candidate.exists() {
            return candidate;
        }
    }

    PathBuf::from("xl-bridge.exe")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wine_path_mapping() {
        assert_eq!(
            to_wine_path(Path::new("/home/user/excel.xlsx")),
            "Z:\\home\\user\\excel.xlsx"
        );

        // relative paths resolve against the current directory
        let mapped = to_wine_path(Path::new("excel.xlsx"));
        assert!(mapped.starts_with("Z:\\"));
        assert!(mapped.ends_with("\\excel.xlsx"));
        assert!(!mapped.contains('/'));
    }

    #[test]
    fn missing_bridge_exe_is_reported() {
        let config = BridgeConfig {
            bridge_exe_path: Some(PathBuf::from("/nonexistent/xl-bridge.exe")),
            ..BridgeConfig::default()
        };
        let err = Bridge::start(config).map(|_| ()).unwrap_err();
        match err {
            BridgeError::BridgeExeNotFound(path) => assert!(path.contains("nonexistent")),
            other => panic!("expected BridgeExeNotFound, got {other:?}"),
        }
    }
}

//! Error types for the Google Sheets client.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything here is fatal to the flow that hits it: there is no retry,
/// no partial rollback, and no recovery anywhere in this client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read service account key '{path}': {source}")]
    KeyFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed service account key: {0}")]
    KeyParse(#[from] serde_json::Error),

    #[error("failed to sign JWT assertion: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("token exchange failed (HTTP {status}): {body}")]
    TokenExchange { status: u16, body: String },

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("no spreadsheet titled '{0}' is accessible to the service account")]
    SpreadsheetNotFound(String),

    #[error("spreadsheet '{0}' has no sheets")]
    NoSheets(String),

    #[error("invalid range: {0}")]
    Range(#[from] sheetpilot_core::Error),
}

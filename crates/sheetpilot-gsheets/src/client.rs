//! Client construction and opening spreadsheets by title.

use std::time::Duration;

use serde::Deserialize;

use crate::auth::{fetch_token, ServiceAccountKey, SCOPES};
use crate::error::{Error, Result};
use crate::worksheet::Worksheet;

pub(crate) const SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_FILES_ENDPOINT: &str = "https://www.googleapis.com/drive/v3/files";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

/// An authorized Sheets/Drive API client.
///
/// Constructed once per run; holds the HTTP connection pool and the bearer
/// token for its whole lifetime.
pub struct Client {
    http: reqwest::Client,
    token: String,
}

impl Client {
    /// Authorize with a service-account key using the fixed [`SCOPES`] pair.
    pub async fn authorize(key: &ServiceAccountKey) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let token = fetch_token(&http, key, &SCOPES).await?;
        tracing::info!(client_email = %key.client_email, "authorized service account");

        Ok(Self {
            http,
            token: token.access_token,
        })
    }

    /// Find a spreadsheet by its exact title and open it.
    ///
    /// Fails with [`Error::SpreadsheetNotFound`] if no spreadsheet with that
    /// title is shared with the service account.
    pub async fn open_by_title(&self, title: &str) -> Result<Spreadsheet<'_>> {
        let query = format!(
            "name = '{}' and mimeType = '{SPREADSHEET_MIME}' and trashed = false",
            title.replace('\'', "\\'"),
        );
        let response = self
            .http
            .get(DRIVE_FILES_ENDPOINT)
            .bearer_auth(&self.token)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id,name)"),
                ("pageSize", "10"),
            ])
            .send()
            .await?;
        let listing: FileList = api_json(response).await?;

        let file = listing
            .files
            .into_iter()
            .find(|f| f.name == title)
            .ok_or_else(|| Error::SpreadsheetNotFound(title.to_string()))?;
        tracing::info!(title, id = %file.id, "resolved spreadsheet");

        let response = self
            .http
            .get(format!("{SHEETS_ENDPOINT}/{}", file.id))
            .bearer_auth(&self.token)
            .query(&[("fields", "sheets.properties(title,index)")])
            .send()
            .await?;
        let meta: SpreadsheetMeta = api_json(response).await?;

        if meta.sheets.is_empty() {
            return Err(Error::NoSheets(title.to_string()));
        }

        Ok(Spreadsheet {
            client: self,
            id: file.id,
            sheet_titles: meta
                .sheets
                .into_iter()
                .map(|s| s.properties.title)
                .collect(),
        })
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }
}

/// An opened spreadsheet: its Drive file ID and sheet listing.
pub struct Spreadsheet<'a> {
    client: &'a Client,
    id: String,
    sheet_titles: Vec<String>,
}

impl<'a> Spreadsheet<'a> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sheet_titles(&self) -> &[String] {
        &self.sheet_titles
    }

    /// The spreadsheet's first sheet. `open_by_title` guarantees at least
    /// one sheet exists.
    pub fn sheet1(&self) -> Worksheet<'a> {
        Worksheet::new(
            self.client,
            self.id.clone(),
            self.sheet_titles[0].clone(),
        )
    }
}

/// Decode a success body, or map the service's error envelope onto
/// [`Error::Api`].
pub(crate) async fn api_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or(body);
    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_is_decoded() {
        let body = r#"{"error": {"code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND"}}"#;
        let envelope: ApiErrorEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.error.message, "Requested entity was not found.");
    }

    #[test]
    fn spreadsheet_metadata_is_decoded() {
        let body = r#"{"sheets": [
            {"properties": {"title": "Sheet1", "index": 0}},
            {"properties": {"title": "Notes", "index": 1}}
        ]}"#;
        let meta: SpreadsheetMeta = serde_json::from_str(body).unwrap();
        let titles: Vec<&str> = meta
            .sheets
            .iter()
            .map(|s| s.properties.title.as_str())
            .collect();
        assert_eq!(titles, ["Sheet1", "Notes"]);
    }

    #[test]
    fn drive_listing_is_decoded() {
        let body = r#"{"files": [{"id": "abc123", "name": "NH Python"}]}"#;
        let listing: FileList = serde_json::from_str(body).unwrap();
        assert_eq!(listing.files.len(), 1);
        assert_eq!(listing.files[0].id, "abc123");
    }
}

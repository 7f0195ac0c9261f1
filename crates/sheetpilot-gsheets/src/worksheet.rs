//! Worksheet operations: whole-sheet clear, rectangular batch fetch, and
//! single-call batched updates.

use serde::Deserialize;
use serde_json::{json, Value};
use sheetpilot_core::CellRange;

use crate::batch::CellBatch;
use crate::client::{api_json, Client, SHEETS_ENDPOINT};
use crate::error::Result;

/// How the service interprets flushed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueInputOption {
    /// Store strings exactly as sent.
    Raw,
    /// Parse input as if a user typed it: formulas evaluate, numerals
    /// become numbers.
    UserEntered,
}

impl ValueInputOption {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueInputOption::Raw => "RAW",
            ValueInputOption::UserEntered => "USER_ENTERED",
        }
    }
}

/// One sheet of an opened spreadsheet.
pub struct Worksheet<'a> {
    client: &'a Client,
    spreadsheet_id: String,
    title: String,
}

impl<'a> Worksheet<'a> {
    pub(crate) fn new(client: &'a Client, spreadsheet_id: String, title: String) -> Self {
        Self {
            client,
            spreadsheet_id,
            title,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Clear the entire sheet's values and formulas, not just a region.
    pub async fn clear(&self) -> Result<()> {
        let url = self.values_url(&quote_sheet_title(&self.title), Some("clear"));
        tracing::info!(sheet = %self.title, "clearing sheet");
        let response = self
            .client
            .http()
            .post(url)
            .bearer_auth(self.client.token())
            .json(&json!({}))
            .send()
            .await?;
        api_json::<Value>(response).await?;
        Ok(())
    }

    /// Fetch a rectangular region as a dense, row-major [`CellBatch`].
    ///
    /// One network call regardless of the region's size. Rows and cells the
    /// service omits (trailing empties) are padded so the batch always
    /// covers the full rectangle.
    pub async fn range(&self, a1: &str) -> Result<CellBatch> {
        let rect = CellRange::parse(a1)?;
        let url = self.values_url(&sheet_range(&self.title, &rect.to_a1_string()), None);
        let response = self
            .client
            .http()
            .get(url)
            .bearer_auth(self.client.token())
            .query(&[("majorDimension", "ROWS")])
            .send()
            .await?;
        let fetched: ValueRange = api_json(response).await?;
        tracing::debug!(range = %rect, "fetched range");
        Ok(CellBatch::from_rows(rect, fetched.values.unwrap_or_default()))
    }

    /// Flush every cell of a batch back to the sheet in ONE update call.
    ///
    /// This is the whole point of the batch type: collect all intended
    /// values locally, then pay one round trip, never one per cell.
    pub async fn update_cells(&self, batch: &CellBatch, input: ValueInputOption) -> Result<()> {
        let range = sheet_range(&self.title, &batch.range().to_a1_string());
        let url = self.values_url(&range, None);
        tracing::info!(
            range = %batch.range(),
            cells = batch.len(),
            input = input.as_str(),
            "flushing batch"
        );
        let response = self
            .client
            .http()
            .put(url)
            .bearer_auth(self.client.token())
            .query(&[("valueInputOption", input.as_str())])
            .json(&update_body(&range, batch))
            .send()
            .await?;
        api_json::<Value>(response).await?;
        Ok(())
    }

    fn values_url(&self, range: &str, action: Option<&str>) -> String {
        let encoded = urlencoding::encode(range);
        match action {
            Some(action) => format!(
                "{SHEETS_ENDPOINT}/{}/values/{encoded}:{action}",
                self.spreadsheet_id
            ),
            None => format!("{SHEETS_ENDPOINT}/{}/values/{encoded}", self.spreadsheet_id),
        }
    }
}

/// A sheet title quoted for use in an A1 range, e.g. `'Sheet1'`.
fn quote_sheet_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// A sheet-qualified A1 range, e.g. `'Sheet1'!A1:J10`.
fn sheet_range(title: &str, range: &str) -> String {
    format!("{}!{range}", quote_sheet_title(title))
}

/// The `values.update` request body carrying a batch's full value matrix.
fn update_body(range: &str, batch: &CellBatch) -> Value {
    json!({
        "range": range,
        "majorDimension": "ROWS",
        "values": batch.to_matrix(),
    })
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Option<Vec<Vec<Value>>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::product_grid;

    #[test]
    fn input_option_wire_names() {
        assert_eq!(ValueInputOption::Raw.as_str(), "RAW");
        assert_eq!(ValueInputOption::UserEntered.as_str(), "USER_ENTERED");
    }

    #[test]
    fn sheet_ranges_are_quoted() {
        assert_eq!(quote_sheet_title("Sheet1"), "'Sheet1'");
        assert_eq!(quote_sheet_title("Bob's data"), "'Bob''s data'");
        assert_eq!(sheet_range("Sheet1", "A1:J10"), "'Sheet1'!A1:J10");
    }

    #[test]
    fn update_body_carries_the_full_matrix() {
        let rect = CellRange::parse("A1:J10").unwrap();
        let mut batch = CellBatch::from_rows(rect, Vec::new());
        product_grid(&mut batch);

        let body = update_body("'Sheet1'!A1:J10", &batch);
        assert_eq!(body["range"], "'Sheet1'!A1:J10");
        assert_eq!(body["majorDimension"], "ROWS");

        let values = body["values"].as_array().unwrap();
        assert_eq!(values.len(), 10);
        assert!(values.iter().all(|row| row.as_array().unwrap().len() == 10));
        // spot-check the corners: 1*1 and 10*10
        assert_eq!(values[0].as_array().unwrap()[0], json!(1));
        assert_eq!(values[9].as_array().unwrap()[9], json!(100));
    }

    #[test]
    fn empty_fetch_decodes_to_no_values() {
        let fetched: ValueRange =
            serde_json::from_str(r#"{"range": "'Sheet1'!A1:J10", "majorDimension": "ROWS"}"#)
                .unwrap();
        assert!(fetched.values.is_none());
    }
}

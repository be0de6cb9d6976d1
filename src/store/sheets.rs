//! Google Sheets REST adapter (values API, bearer token).

use crate::error::{sanitize_message, DraftError};
use crate::store::{SheetSnapshot, SheetStore};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4";

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Serialize)]
struct AppendBody<'a> {
    values: &'a [Vec<String>],
}

fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Sheets store client
pub struct SheetsStore {
    client: Client,
    access_token: String,
    base_url: Url,
}

impl SheetsStore {
    pub fn new(
        access_token: String,
        base_url: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, DraftError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| DraftError::StoreError(format!("Failed to create HTTP client: {}", e)))?;
        let raw = base_url.unwrap_or_else(|| DEFAULT_SHEETS_BASE_URL.to_string());
        let base_url = Url::parse(&raw)
            .map_err(|e| DraftError::ConfigError(format!("Invalid store base URL '{}': {}", raw, e)))?;
        Ok(Self {
            client,
            access_token,
            base_url,
        })
    }

    /// `{base}/spreadsheets/{id}/values/{last_segment}` with every segment escaped.
    fn values_url(&self, store_id: &str, last_segment: &str) -> Result<Url, DraftError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DraftError::ConfigError(format!("Store base URL '{}' cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(["spreadsheets", store_id, "values", last_segment]);
        Ok(url)
    }

    async fn failure(response: reqwest::Response) -> DraftError {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        DraftError::StoreRequestFailed {
            status,
            message: sanitize_message(&message),
        }
    }
}

#[async_trait]
impl SheetStore for SheetsStore {
    async fn read_last_rows(
        &self,
        store_id: &str,
        sheet: &str,
        n: usize,
    ) -> Result<SheetSnapshot, DraftError> {
        let url = self.values_url(store_id, sheet)?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| DraftError::StoreError(format!("Failed to read sheet '{}': {}", sheet, e)))?;
        if !response.status().is_success() {
            return Err(Self::failure(response).await);
        }
        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| DraftError::StoreError(format!("Failed to parse sheet '{}': {}", sheet, e)))?;
        let values: Vec<Vec<String>> = range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect();
        debug!(sheet, total_rows = values.len(), "Read sheet");
        Ok(SheetSnapshot::from_values(values, n))
    }

    async fn append_rows(
        &self,
        store_id: &str,
        sheet: &str,
        rows: &[Vec<String>],
    ) -> Result<(), DraftError> {
        if rows.is_empty() {
            return Ok(());
        }
        let url = self.values_url(store_id, &format!("{}:append", sheet))?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&AppendBody { values: rows })
            .send()
            .await
            .map_err(|e| DraftError::StoreError(format!("Failed to append to sheet '{}': {}", sheet, e)))?;
        if !response.status().is_success() {
            return Err(Self::failure(response).await);
        }
        info!(sheet, rows = rows.len(), "Appended rows");
        Ok(())
    }

    fn store_name(&self) -> &str {
        "sheets"
    }
}

//! Google Sheets `values` REST endpoints as a [`RowStore`].

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::RowStore;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Thin client for one spreadsheet. Authenticates with a bearer token;
/// obtaining and refreshing that token is the deployment's problem, not
/// this client's.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    spreadsheet_id: String,
    api_token: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

impl SheetsClient {
    pub fn new(spreadsheet_id: &str, api_token: &str, request_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            http,
            spreadsheet_id: spreadsheet_id.to_string(),
            api_token: api_token.to_string(),
        })
    }

    fn values_url(&self, range: &str, suffix: &str) -> String {
        format!(
            "{SHEETS_API_BASE}/{}/values/{range}{suffix}",
            self.spreadsheet_id
        )
    }
}

/// Sheets returns numbers and booleans as JSON scalars; flatten every
/// cell to its string form.
fn cell_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl RowStore for SheetsClient {
    async fn get_range(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let url = self.values_url(range, "");
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("sheets get {range} failed: {status} {body}"));
        }
        let value_range: ValueRange = response.json().await?;
        Ok(value_range
            .values
            .iter()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect())
    }

    async fn append_row(&self, range: &str, values: &[String]) -> Result<()> {
        let url = self.values_url(
            range,
            ":append?valueInputOption=RAW&insertDataOption=INSERT_ROWS",
        );
        let body = serde_json::json!({ "values": [values] });
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("sheets append {range} failed: {status} {body}"));
        }
        Ok(())
    }

    async fn update_row(&self, range: &str, values: &[String]) -> Result<()> {
        let url = self.values_url(range, "?valueInputOption=RAW");
        let body = serde_json::json!({ "values": [values] });
        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("sheets update {range} failed: {status} {body}"));
        }
        Ok(())
    }
}

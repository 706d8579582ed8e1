use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{Result, StockError};
use crate::io::credentials::TokenCache;
use crate::io::{SheetRange, TableLoader, grid_to_table};
use crate::model::Table;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets/";

/// Response body of `spreadsheets.values.get`.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Reads sheet values through the Google Sheets v4 REST API.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    client: Client,
    spreadsheet_id: String,
    tokens: TokenCache,
}

impl SheetsClient {
    pub fn new(client: Client, spreadsheet_id: impl Into<String>, tokens: TokenCache) -> Self {
        Self {
            client,
            spreadsheet_id: spreadsheet_id.into(),
            tokens,
        }
    }

    /// Builds the blocking HTTP client shared by the API and token calls.
    pub fn http_client(timeout: Duration) -> Result<Client> {
        Ok(Client::builder().timeout(timeout).build()?)
    }

    fn values_url(&self, range: &str) -> Result<Url> {
        let mut url = Url::parse(SHEETS_API_BASE)?;
        url.path_segments_mut()
            .map_err(|()| StockError::Transport {
                operation: "build values url",
                message: "base URL cannot hold path segments".into(),
            })?
            .pop_if_empty()
            .push(&self.spreadsheet_id)
            .push("values")
            .push(range);
        Ok(url)
    }
}

impl TableLoader for SheetsClient {
    #[instrument(level = "debug", skip(self), fields(spreadsheet = %self.spreadsheet_id))]
    fn fetch(&self, sheet: &str, range: SheetRange) -> Result<Table> {
        let a1 = range.a1(sheet);
        let url = self.values_url(&a1)?;
        let token = self.tokens.access_token()?;

        let response = self.client.get(url).bearer_auth(token).send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StockError::Transport {
                operation: "read sheet values",
                message: format!("{status}: {body}"),
            });
        }

        let payload: ValueRange = response.json()?;
        debug!(range = %a1, rows = payload.values.len(), "values fetched");
        Ok(grid_to_table(values_to_grid(payload.values), range))
    }
}

fn values_to_grid(values: Vec<Vec<serde_json::Value>>) -> Vec<Vec<String>> {
    values
        .into_iter()
        .map(|row| row.into_iter().map(value_to_cell).collect())
        .collect()
}

fn value_to_cell(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_percent_encoded_in_path() {
        let client = Client::new();
        let tokens = TokenCache::new("token.json".into(), None, client.clone());
        let sheets = SheetsClient::new(client, "sheet-id", tokens);
        let url = sheets
            .values_url(&SheetRange::Full.a1("Minimum Inventory"))
            .expect("url built");
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-id/values/'Minimum%20Inventory'!A:ZZ"
        );
    }

    #[test]
    fn non_string_values_become_text() {
        let payload: ValueRange =
            serde_json::from_str(r#"{"range":"x","values":[["Bolt",-3,null]]}"#)
                .expect("payload parsed");
        let grid = values_to_grid(payload.values);
        assert_eq!(grid, vec![vec!["Bolt".to_string(), "-3".into(), String::new()]]);
    }
}

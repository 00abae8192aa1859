//! Read-only client for the spreadsheet values endpoint.
//!
//! One GET per fetch against the Sheets `values.get` REST shape:
//! `GET {endpoint}/{sheet_id}/values/{range}?key={api_key}`, response body
//! `{"values": [[...], ...]}`. The first row is the header; everything after
//! it is data. This system never writes to the sheet.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use super::snapshot::SheetSnapshot;

/// Base URL of the spreadsheet values API.
const SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Longest error body kept for display.
const MAX_ERROR_BODY: usize = 300;

/// Errors from a spreadsheet read.
#[derive(Debug, Clone, Error)]
pub enum SheetError {
    /// The request never completed (DNS, connect, TLS, timeout).
    #[error("sheet read failed: {0}")]
    Transport(String),

    /// The API answered with a non-success status (bad key, missing sheet).
    #[error("sheet read rejected (HTTP {code}): {body}")]
    Status { code: u16, body: String },

    /// The response was not the expected values JSON.
    #[error("sheet response was not valid values JSON: {0}")]
    Decode(String),
}

/// Source of spreadsheet rows.
///
/// The seam between the cache/poller and the real spreadsheet API; tests
/// substitute a scripted source.
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Performs one remote read and returns a fresh snapshot.
    async fn fetch_rows(&self) -> Result<SheetSnapshot, SheetError>;
}

/// A [`RowSource`] backed by the spreadsheet REST API.
pub struct SheetsClient {
    http: reqwest::Client,
    sheet_id: String,
    range: String,
    api_key: Option<String>,
}

impl SheetsClient {
    /// Creates a client for one sheet and range.
    pub fn new(
        http: reqwest::Client,
        sheet_id: impl Into<String>,
        range: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        SheetsClient {
            http,
            sheet_id: sheet_id.into(),
            range: range.into(),
            api_key,
        }
    }

    fn values_url(&self) -> String {
        format!("{SHEETS_ENDPOINT}/{}/values/{}", self.sheet_id, self.range)
    }
}

impl std::fmt::Debug for SheetsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsClient")
            .field("sheet_id", &self.sheet_id)
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RowSource for SheetsClient {
    async fn fetch_rows(&self) -> Result<SheetSnapshot, SheetError> {
        let mut request = self.http.get(self.values_url());
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key.as_str())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SheetError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SheetError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(SheetError::Status {
                code: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        parse_values_response(&body)
    }
}

/// The values endpoint response. `values` is absent entirely for an empty
/// range, hence the default.
#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Decodes a values response body into a snapshot.
///
/// Cells are usually JSON strings, but unformatted reads can return numbers
/// or booleans; those are stringified rather than rejected.
pub(crate) fn parse_values_response(body: &str) -> Result<SheetSnapshot, SheetError> {
    let parsed: ValuesResponse =
        serde_json::from_str(body).map_err(|e| SheetError::Decode(e.to_string()))?;

    let mut rows = parsed.values.into_iter().map(|row| {
        row.into_iter()
            .map(|cell| match cell {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect::<Vec<String>>()
    });

    let headers = rows.next().unwrap_or_default();
    Ok(SheetSnapshot::new(headers, rows.collect()))
}

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= MAX_ERROR_BODY {
        return trimmed.to_string();
    }
    let mut cut = MAX_ERROR_BODY;
    while !trimmed.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…", &trimmed[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_and_rows() {
        let body = r#"{
            "range": "Sheet1!A1:B3",
            "majorDimension": "ROWS",
            "values": [["username", "posts"], ["natgeo", "10"], ["nasa", "3"]]
        }"#;

        let snapshot = parse_values_response(body).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.headers(), ["username", "posts"]);
        assert_eq!(snapshot.record(0).unwrap()["username"], "natgeo");
    }

    #[test]
    fn missing_values_means_empty_sheet() {
        let snapshot = parse_values_response(r#"{"range": "Sheet1"}"#).unwrap();
        assert!(snapshot.is_empty());
        assert!(snapshot.headers().is_empty());
    }

    #[test]
    fn header_only_sheet_has_zero_rows() {
        let body = r#"{"values": [["username", "posts"]]}"#;
        let snapshot = parse_values_response(body).unwrap();
        assert_eq!(snapshot.len(), 0);
        assert_eq!(snapshot.headers(), ["username", "posts"]);
    }

    #[test]
    fn numeric_cells_are_stringified() {
        let body = r#"{"values": [["username", "posts"], ["natgeo", 10]]}"#;
        let snapshot = parse_values_response(body).unwrap();
        assert_eq!(snapshot.record(0).unwrap()["posts"], "10");
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let err = parse_values_response("<html>login</html>").unwrap_err();
        assert!(matches!(err, SheetError::Decode(_)));
    }

    #[test]
    fn values_url_embeds_sheet_and_range() {
        let client = SheetsClient::new(reqwest::Client::new(), "sheet-123", "Sheet1", None);
        assert_eq!(
            client.values_url(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-123/values/Sheet1"
        );
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let long = "x".repeat(1000);
        let truncated = truncate_body(&long);
        assert!(truncated.chars().count() <= MAX_ERROR_BODY + 1);
        assert!(truncated.ends_with('…'));
    }
}

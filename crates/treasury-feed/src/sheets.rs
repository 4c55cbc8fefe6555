//! Google Sheets values client and column mapping.

use std::{env, time::Duration};

use chrono::Days;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use treasury_core::{ColumnMapping, Date, Observation, RecordTable};

use crate::{Result, error::FeedError};

/// Base URL for the Sheets v4 API.
const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";

/// Request timeout for sheet fetches.
pub const SHEETS_TIMEOUT: Duration = Duration::from_secs(4);

/// Day zero of spreadsheet serial dates.
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

const SATS_PER_BTC: f64 = 100_000_000.0;

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

/// Google Sheets API client.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl SheetsClient {
    /// Create a new client with the given API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(SHEETS_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: SHEETS_BASE_URL.to_string(),
        })
    }

    /// Create a new client from the `GOOGLE_API_KEY` environment variable.
    ///
    /// This will also load from a `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment variable is not set.
    pub fn from_env() -> Result<Self> {
        // Try to load .env file (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_key = env::var("GOOGLE_API_KEY").map_err(|_| FeedError::MissingApiKey)?;
        Self::new(api_key)
    }

    /// Point the client at another API host.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the values URL, percent-encoding the range.
    fn url(&self, spreadsheet_id: &str, range: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| FeedError::Api(format!("invalid base URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| FeedError::Api(format!("cannot-be-a-base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", spreadsheet_id, "values", range]);
        Ok(url)
    }

    /// Fetch the raw rows of a range, header row included.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::AccessDenied`], [`FeedError::SpreadsheetNotFound`]
    /// or [`FeedError::BadRequest`] for 403, 404 and 400 responses, and
    /// [`FeedError::Api`] for any other non-success status.
    pub async fn values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<Value>>> {
        let url = self.url(spreadsheet_id, range)?;
        let response = self
            .client
            .get(url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("majorDimension", "ROWS"),
                ("valueRenderOption", "UNFORMATTED_VALUE"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::FORBIDDEN => FeedError::AccessDenied(spreadsheet_id.to_string()),
                StatusCode::NOT_FOUND => FeedError::SpreadsheetNotFound(spreadsheet_id.to_string()),
                StatusCode::BAD_REQUEST => FeedError::BadRequest(
                    serde_json::from_str::<ApiErrorBody>(&text)
                        .map(|b| b.error.message)
                        .unwrap_or_else(|_| "Unknown error".to_string()),
                ),
                _ => FeedError::Api(format!("HTTP {status}: {text}")),
            });
        }

        let body: ValueRange = response.json().await?;
        tracing::info!(
            spreadsheet_id,
            rows = body.values.len(),
            "retrieved rows from Google Sheet"
        );
        Ok(body.values)
    }

    /// Fetch a range and map it into a record table.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails or [`table_from_values`] rejects
    /// the rows.
    pub async fn load_table(
        &self,
        spreadsheet_id: &str,
        range: &str,
        columns: &ColumnMapping,
    ) -> Result<RecordTable> {
        let values = self.values(spreadsheet_id, range).await?;
        table_from_values(&values, columns)
    }
}

/// Convert a spreadsheet serial day number to a date. Fractions of a day
/// are discarded.
///
/// # Errors
///
/// Returns an error for non-finite, non-positive or out-of-range serials.
/// Serial zero is how an empty date cell reads back, so it counts as missing.
pub fn serial_to_date(serial: f64) -> Result<Date> {
    let invalid = || treasury_core::TreasuryError::InvalidDate(format!("serial {serial}"));
    if !serial.is_finite() || serial <= 0.0 || serial > f64::from(u32::MAX) {
        return Err(invalid().into());
    }
    let (y, m, d) = SERIAL_EPOCH;
    Date::from_ymd_opt(y, m, d)
        .and_then(|epoch| epoch.checked_add_days(Days::new(serial.floor() as u64)))
        .ok_or_else(|| invalid().into())
}

/// Coerce a cell to a number: numbers pass through, numeric strings are
/// parsed, anything else is missing.
fn numeric(cell: Option<&Value>) -> Option<f64> {
    let value = match cell? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

fn header_name(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Map sheet rows onto observations.
///
/// The first row is the header. Short rows are padded with empty cells. Rows
/// where any mapped column is not numeric are dropped with a warning; the
/// remaining rows are sorted by date. The forward btc-per-share column is
/// optional: a missing header is logged, and a non-numeric cell leaves the
/// row's forward value empty.
///
/// # Errors
///
/// Returns [`FeedError::NoData`] for an empty range or when no row survives,
/// and [`FeedError::Schema`] when a mapped column is missing from the header.
pub fn table_from_values(values: &[Vec<Value>], columns: &ColumnMapping) -> Result<RecordTable> {
    let Some((header, rows)) = values.split_first() else {
        return Err(FeedError::NoData(
            "no data found in the specified sheet range".to_string(),
        ));
    };
    let headers: Vec<String> = header.iter().map(header_name).collect();

    let mut required: Vec<&str> = columns.required();
    required.extend(columns.btc_per_share.as_deref());
    required.extend(columns.btc_price.as_deref());

    let missing: Vec<String> = required
        .iter()
        .filter(|c| !headers.iter().any(|h| h == *c))
        .map(|c| (*c).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(FeedError::Schema {
            missing,
            found: headers,
        });
    }

    let index = |name: &str| headers.iter().position(|h| h == name);
    let idx: Vec<Option<usize>> = required.iter().map(|c| index(c)).collect();
    let width = headers.len();

    let forward_idx = columns.forward_btc_per_share.as_deref().and_then(|name| {
        let i = index(name);
        if i.is_none() {
            tracing::warn!(column = name, "forward btc-per-share column not found in sheet");
        }
        i
    });
    let forward_scale = if columns.forward_in_sats { SATS_PER_BTC } else { 1.0 };

    let mut dropped = 0usize;
    let mut observations = Vec::with_capacity(rows.len());
    for row in rows {
        // Pad short rows and ignore cells beyond the header
        let cell = |i: Option<usize>| i.filter(|&i| i < width).and_then(|i| row.get(i));
        let nums: Option<Vec<f64>> = idx.iter().map(|&i| numeric(cell(i))).collect();
        let Some(nums) = nums else {
            dropped += 1;
            continue;
        };
        let Ok(date) = serial_to_date(nums[0]) else {
            dropped += 1;
            continue;
        };

        let mut extra = nums[4..].iter();
        let btc_per_share = columns.btc_per_share.as_ref().and_then(|_| extra.next().copied());
        let btc_price = columns.btc_price.as_ref().and_then(|_| extra.next().copied());

        let mut obs = Observation::new(
            date,
            nums[1],
            nums[2],
            nums[3],
            btc_price.unwrap_or(f64::NAN),
        );
        if let Some(v) = btc_per_share {
            obs = obs.with_btc_per_diluted_share(v);
        }
        if forward_idx.is_some() {
            let forward = numeric(cell(forward_idx)).map(|v| v / forward_scale);
            obs = obs.with_forward_btc_per_share(forward);
        }
        observations.push(obs);
    }

    if dropped > 0 {
        tracing::warn!(dropped, "removed sheet rows with invalid data");
    }
    if observations.is_empty() {
        return Err(FeedError::NoData(
            "no valid data rows after cleaning".to_string(),
        ));
    }

    let table = RecordTable::from(observations).sorted_by_date();
    if let Some((start, end)) = table.date_span() {
        tracing::info!(rows = table.len(), %start, %end, "loaded records from Google Sheets");
    }
    Ok(table)
}

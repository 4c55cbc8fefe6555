//! Error types for the data source clients.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading a record table.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Missing API key.
    #[error("GOOGLE_API_KEY environment variable not set")]
    MissingApiKey,

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("Failed to parse JSON response: {0}")]
    Json(#[from] serde_json::Error),

    /// The remote API returned a non-success status.
    #[error("API error: {0}")]
    Api(String),

    /// The spreadsheet is not publicly readable.
    #[error(
        "Access denied to spreadsheet {0}. Make sure the sheet is publicly readable \
         or 'Anyone with the link can view'."
    )]
    AccessDenied(String),

    /// The spreadsheet does not exist.
    #[error("Spreadsheet {0} not found")]
    SpreadsheetNotFound(String),

    /// The request was rejected as malformed.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The payload does not have the expected fields.
    #[error("Missing required fields: {missing:?}. Available fields: {found:?}")]
    Schema {
        /// Fields that were required but absent.
        missing: Vec<String>,
        /// Fields that were present.
        found: Vec<String>,
    },

    /// No usable rows were found.
    #[error("No data available: {0}")]
    NoData(String),

    /// The local fallback snapshot could not be read.
    #[error("Could not read fallback data file {path}: {source}")]
    Fallback {
        /// Snapshot path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Conversion into the core data model failed.
    #[error(transparent)]
    Treasury(#[from] treasury_core::TreasuryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_lists_fields() {
        let err = FeedError::Schema {
            missing: vec!["dates".to_string()],
            found: vec!["btc_balance".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Missing required fields: [\"dates\"]. Available fields: [\"btc_balance\"]"
        );
    }

    #[test]
    fn test_treasury_error_is_transparent() {
        let err: FeedError = treasury_core::TreasuryError::InvalidDate("x".to_string()).into();
        assert_eq!(err.to_string(), "Invalid date: x");
    }
}

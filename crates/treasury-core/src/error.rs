//! Error types for the treasury analytics core.

use thiserror::Error;

/// The main error type for treasury analysis operations.
#[derive(Debug, Error)]
pub enum TreasuryError {
    /// Too few usable points for the requested computation.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// A ratio whose denominator is zero or missing.
    #[error("Division undefined: {0}")]
    DivisionUndefined(String),

    /// Malformed or inconsistent input data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Required columns or fields are absent from a source.
    #[error("Missing required columns: {missing:?}. Available columns: {found:?}")]
    MissingColumns {
        /// Fields that were required but not present.
        missing: Vec<String>,
        /// Fields that were present in the source.
        found: Vec<String>,
    },

    /// A date string or serial number could not be converted.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// A company or chart configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for treasury analysis operations.
pub type Result<T> = std::result::Result<T, TreasuryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TreasuryError::InsufficientData("need 2 points".to_string());
        assert_eq!(err.to_string(), "Insufficient data: need 2 points");

        let err = TreasuryError::MissingColumns {
            missing: vec!["BTC Held".to_string()],
            found: vec!["Date".to_string(), "FD Shares".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Missing required columns: [\"BTC Held\"]. Available columns: [\"Date\", \"FD Shares\"]"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: TreasuryError = io.into();
        assert!(matches!(err, TreasuryError::Io(_)));
    }
}

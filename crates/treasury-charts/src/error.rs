//! Error types for chart generation.

use thiserror::Error;

/// Errors that can occur while building or rendering a chart.
#[derive(Debug, Error)]
pub enum ChartError {
    /// The data cannot support this chart.
    #[error("Insufficient data for {chart}: {reason}")]
    InsufficientData {
        /// Chart kind name.
        chart: &'static str,
        /// Why the chart was skipped.
        reason: String,
    },

    /// Error from the analytics core.
    #[error(transparent)]
    Treasury(#[from] treasury_core::TreasuryError),

    /// Failed to write the artifact.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize the chart document.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The image backend failed to draw or encode the chart.
    #[error("Render error: {0}")]
    Render(String),
}

/// Result type for chart operations.
pub type Result<T> = std::result::Result<T, ChartError>;

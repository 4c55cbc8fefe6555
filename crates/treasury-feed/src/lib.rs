//! Data source clients for treasury record tables.
//!
//! Two sources are supported:
//!
//! - a JSON feed ([`FeedClient`]) whose URL comes from a `{PREFIX}_DATA_URL`
//!   environment variable, backed by a local snapshot used whenever the fetch
//!   fails
//! - a Google Sheets range ([`SheetsClient`]) mapped onto observation fields
//!   through a [`ColumnMapping`](treasury_core::ColumnMapping)
//!
//! # Usage
//!
//! ```rust,ignore
//! use treasury_feed::FeedClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = FeedClient::from_env("H100", "companies/h100/fallback_data.json")?;
//!     let (table, origin) = client.load().await?;
//!     println!("{} rows from {origin:?}", table.len());
//!     Ok(())
//! }
//! ```
//!
//! # Environment Variables
//!
//! ```bash
//! H100_DATA_URL=https://example.com/h100.json
//! GOOGLE_API_KEY=your_api_key_here
//! ```

mod client;
mod error;
mod sheets;
mod types;

pub use client::{FEED_TIMEOUT, FeedClient, LoadOrigin};
pub use error::FeedError;
pub use sheets::{SHEETS_TIMEOUT, SheetsClient, serial_to_date, table_from_values};
pub use types::{FeedPayload, HistoricalData, REQUIRED_FIELDS};

/// Result type for data source operations.
pub type Result<T> = std::result::Result<T, FeedError>;

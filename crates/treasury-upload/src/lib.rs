//! Upload of rendered chart artifacts to S3-compatible object storage.
//!
//! Every file with the chosen extension in a company's output directory is
//! stored under `{prefix}/{company_lower}/{filename}` with public-read
//! access, a ten-minute cache lifetime and company/date/source metadata.
//! Individual failures are collected in an [`UploadReport`] rather than
//! aborting the batch.
//!
//! # Usage
//!
//! ```rust,ignore
//! use treasury_upload::{S3ObjectStore, UploadConfig, Uploader};
//!
//! let config = UploadConfig::from_env()?;
//! let store = S3ObjectStore::from_config(&config).await;
//! let uploader = Uploader::new(store, config, "png");
//! let report = uploader.upload_company_charts("output/h100".as_ref(), "H100").await?;
//! println!("{} uploaded, {} failed", report.success_count(), report.failure_count());
//! ```
//!
//! # Environment Variables
//!
//! ```bash
//! S3_BUCKET_NAME=treasury-charts
//! AWS_ACCESS_KEY_ID=...
//! AWS_SECRET_ACCESS_KEY=...
//! AWS_REGION=us-east-1
//! AWS_ENDPOINT_URL=http://localhost:9000
//! S3_KEY_PREFIX=charts
//! ```

mod config;
mod error;
mod store;
mod uploader;

pub use config::{DEFAULT_KEY_PREFIX, DEFAULT_REGION, UploadConfig};
pub use error::UploadError;
pub use store::{ObjectMeta, ObjectStore, S3ObjectStore};
pub use uploader::{
    CACHE_CONTROL, FailedFile, METADATA_SOURCE, MultiUploadReport, PUBLIC_READ, UploadReport,
    UploadedFile, Uploader, content_type_for,
};

/// Result type for upload operations.
pub type Result<T> = std::result::Result<T, UploadError>;

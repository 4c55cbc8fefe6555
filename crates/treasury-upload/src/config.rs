//! Object-store target configuration.

use std::env;

use serde::{Deserialize, Serialize};

use crate::{Result, error::UploadError};

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default key prefix.
pub const DEFAULT_KEY_PREFIX: &str = "charts";

/// Bucket, region and key layout for uploads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Target bucket.
    pub bucket: String,
    /// Bucket region.
    pub region: String,
    /// Custom endpoint for S3-compatible services; path-style addressing is
    /// used when set.
    pub endpoint_url: Option<String>,
    /// Leading key segment.
    pub key_prefix: String,
}

impl UploadConfig {
    /// Create a configuration with default region and prefix.
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: DEFAULT_REGION.to_string(),
            endpoint_url: None,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    /// Read `S3_BUCKET_NAME`, `AWS_REGION`, `AWS_ENDPOINT_URL` and
    /// `S3_KEY_PREFIX`.
    ///
    /// This will also load from a `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::MissingConfig`] when no bucket is configured.
    pub fn from_env() -> Result<Self> {
        // Try to load .env file (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let var = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());

        let bucket = var("S3_BUCKET_NAME").ok_or(UploadError::MissingConfig("S3_BUCKET_NAME"))?;
        Ok(Self {
            bucket,
            region: var("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            endpoint_url: var("AWS_ENDPOINT_URL"),
            key_prefix: var("S3_KEY_PREFIX").unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string()),
        })
    }

    /// Object key: `{prefix}/{company_lower}/{filename}`.
    #[must_use]
    pub fn key_for(&self, company: &str, filename: &str) -> String {
        format!(
            "{}/{}/{filename}",
            self.key_prefix.trim_end_matches('/'),
            company.to_lowercase()
        )
    }

    /// Public virtual-hosted URL of the object.
    #[must_use]
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{key}",
            self.bucket, self.region
        )
    }
}

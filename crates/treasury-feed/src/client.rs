//! JSON feed client with local snapshot fallback.

use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use reqwest::Client;
use treasury_core::RecordTable;

use crate::{Result, error::FeedError, types::FeedPayload};

/// Request timeout for feed fetches.
pub const FEED_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the table actually came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOrigin {
    /// Fetched from the remote feed.
    Remote(String),
    /// Read from the local snapshot.
    Fallback(PathBuf),
}

/// Treasury data feed client.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
    url: Option<String>,
    fallback_path: PathBuf,
}

impl FeedClient {
    /// Create a client for `url` that falls back to `fallback_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: Option<String>, fallback_path: impl Into<PathBuf>) -> Result<Self> {
        let client = Client::builder().timeout(FEED_TIMEOUT).build()?;
        Ok(Self {
            client,
            url,
            fallback_path: fallback_path.into(),
        })
    }

    /// Create a client whose URL comes from `{PREFIX}_DATA_URL`.
    ///
    /// This will also load from a `.env` file if present. A missing variable
    /// is not an error: the client then reads the fallback directly.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_env(prefix: &str, fallback_path: impl Into<PathBuf>) -> Result<Self> {
        // Try to load .env file (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let url = env::var(Self::env_var(prefix))
            .ok()
            .filter(|u| !u.trim().is_empty());
        Self::new(url, fallback_path)
    }

    /// Name of the URL variable for a prefix, e.g. `H100_DATA_URL`.
    #[must_use]
    pub fn env_var(prefix: &str) -> String {
        if prefix.is_empty() {
            "DATA_URL".to_string()
        } else {
            format!("{}_DATA_URL", prefix.to_uppercase())
        }
    }

    /// Configured feed URL, if any.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Fetch the remote payload and convert it into a table.
    async fn fetch_table(&self, url: &str) -> Result<RecordTable> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(FeedError::Api(format!("HTTP {status} from {url}")));
        }

        let text = response.text().await?;
        FeedPayload::parse(&text)?.into_table()
    }

    /// Read and parse the local snapshot.
    fn read_fallback(path: &Path) -> Result<FeedPayload> {
        let text = std::fs::read_to_string(path).map_err(|source| FeedError::Fallback {
            path: path.to_path_buf(),
            source,
        })?;
        FeedPayload::parse(&text)
    }

    /// Load the record table, preferring the remote feed.
    ///
    /// Any remote failure (transport error, non-success status, malformed or
    /// incomplete JSON, arrays that do not line up, bad dates) is logged and
    /// recovered by reading the fallback.
    ///
    /// # Errors
    ///
    /// Returns an error only when the fallback is missing or cannot be
    /// converted into a table.
    pub async fn load(&self) -> Result<(RecordTable, LoadOrigin)> {
        if let Some(url) = &self.url {
            tracing::info!(url = %url, "loading data from feed");
            match self.fetch_table(url).await {
                Ok(table) => {
                    tracing::info!(rows = table.len(), "loaded data from feed");
                    return Ok((table, LoadOrigin::Remote(url.clone())));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "feed load failed, falling back to local file");
                }
            }
        }

        tracing::info!(path = %self.fallback_path.display(), "loading data from local file");
        let table = Self::read_fallback(&self.fallback_path)?.into_table()?;
        tracing::info!(rows = table.len(), "loaded data from local file");
        Ok((table, LoadOrigin::Fallback(self.fallback_path.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    const PAYLOAD: &str = r#"{"historicalData": {
        "dates": ["2025-06-01", "2025-06-02"],
        "btc_balance": [10.0, 20.0],
        "stock_prices": [1.0, 2.0],
        "btc_prices": [100000.0, 100000.0],
        "diluted_shares_outstanding": [1000.0, 1000.0]
    }}"#;

    const FALLBACK: &str = r#"{"historicalData": {
        "dates": ["2025-01-01"],
        "btc_balance": [5.0],
        "stock_prices": [1.0],
        "btc_prices": [90000.0],
        "diluted_shares_outstanding": [1000.0]
    }}"#;

    fn fallback_file(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("fallback_data.json");
        std::fs::write(&path, FALLBACK).unwrap();
        path
    }

    #[test]
    fn test_env_var_name() {
        assert_eq!(FeedClient::env_var("h100"), "H100_DATA_URL");
        assert_eq!(FeedClient::env_var(""), "DATA_URL");
    }

    #[tokio::test]
    async fn test_load_from_feed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAYLOAD))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let url = format!("{}/data.json", server.uri());
        let client = FeedClient::new(Some(url.clone()), fallback_file(&dir)).unwrap();

        let (table, origin) = client.load().await.unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(origin, LoadOrigin::Remote(url));
    }

    #[tokio::test]
    async fn test_falls_back_on_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let fallback = fallback_file(&dir);
        let client = FeedClient::new(Some(server.uri()), fallback.clone()).unwrap();

        let (table, origin) = client.load().await.unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(origin, LoadOrigin::Fallback(fallback));
    }

    #[tokio::test]
    async fn test_falls_back_on_malformed_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = FeedClient::new(Some(server.uri()), fallback_file(&dir)).unwrap();

        let (table, _) = client.load().await.unwrap();
        assert_eq!(table.rows()[0].btc_balance, 5.0);
    }

    #[tokio::test]
    async fn test_falls_back_on_misaligned_arrays() {
        let server = MockServer::start().await;
        let misaligned = r#"{"historicalData": {
            "dates": ["2025-06-01", "2025-06-02"],
            "btc_balance": [10.0],
            "stock_prices": [1.0, 2.0],
            "btc_prices": [100000.0, 100000.0],
            "diluted_shares_outstanding": [1000.0, 1000.0]
        }}"#;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(misaligned))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let fallback = fallback_file(&dir);
        let client = FeedClient::new(Some(server.uri()), fallback.clone()).unwrap();

        let (table, origin) = client.load().await.unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(origin, LoadOrigin::Fallback(fallback));
    }

    #[tokio::test]
    async fn test_falls_back_on_bad_date() {
        let server = MockServer::start().await;
        let bad_date = PAYLOAD.replace("2025-06-02", "June 2nd");
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(bad_date))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = FeedClient::new(Some(server.uri()), fallback_file(&dir)).unwrap();

        let (table, _) = client.load().await.unwrap();
        assert_eq!(table.rows()[0].btc_balance, 5.0);
    }

    #[tokio::test]
    async fn test_missing_fallback_is_fatal() {
        let client = FeedClient::new(None, "/nonexistent/fallback_data.json").unwrap();
        assert!(matches!(
            client.load().await,
            Err(FeedError::Fallback { .. })
        ));
    }

    #[tokio::test]
    async fn test_unparseable_fallback_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, r#"{"historicalData": {"dates": []}}"#).unwrap();

        let client = FeedClient::new(None, path).unwrap();
        assert!(matches!(
            client.load().await,
            Err(FeedError::Schema { .. })
        ));
    }
}

//! Object stores.

use aws_sdk_s3::{
    Client,
    config::{BehaviorVersion, Region},
    error::DisplayErrorContext,
    primitives::ByteStream,
    types::ObjectCannedAcl,
};

use crate::{Result, config::UploadConfig, error::UploadError};

/// Per-object headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    /// MIME type.
    pub content_type: String,
    /// `Cache-Control` value.
    pub cache_control: String,
    /// Canned ACL.
    pub acl: String,
    /// User metadata, sent as `x-amz-meta-*` headers.
    pub metadata: Vec<(String, String)>,
}

/// A destination for uploaded objects.
pub trait ObjectStore {
    /// Store `body` under `key`.
    fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        meta: &ObjectMeta,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// S3 bucket written through the AWS SDK with SigV4-signed requests.
///
/// Credentials come from the standard AWS provider chain
/// (`AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY`, profiles, instance roles).
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Build a client for `config`'s region and endpoint.
    ///
    /// A custom endpoint switches to path-style addressing, which
    /// S3-compatible services expect.
    pub async fn from_config(config: &UploadConfig) -> Self {
        let sdk = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;
        let mut builder = aws_sdk_s3::config::Builder::from(&sdk);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        tracing::debug!(
            bucket = %config.bucket,
            region = %config.region,
            endpoint = ?config.endpoint_url,
            "S3 client configured"
        );
        Self::with_client(Client::from_conf(builder.build()), config.bucket.clone())
    }

    /// Use an existing client.
    #[must_use]
    pub fn with_client(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Target bucket.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &str, body: Vec<u8>, meta: &ObjectMeta) -> Result<()> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(&meta.content_type)
            .cache_control(&meta.cache_control)
            .acl(ObjectCannedAcl::from(meta.acl.as_str()));
        for (name, value) in &meta.metadata {
            request = request.metadata(name, value);
        }

        request.send().await.map_err(|e| UploadError::S3 {
            key: key.to_string(),
            message: DisplayErrorContext(&e).to_string(),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::config::Credentials;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, header_exists, method, path},
    };

    const ACCESS_DENIED: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
        <Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>";

    fn meta() -> ObjectMeta {
        ObjectMeta {
            content_type: "image/png".to_string(),
            cache_control: "max-age=600".to_string(),
            acl: "public-read".to_string(),
            metadata: vec![("company".to_string(), "H100".to_string())],
        }
    }

    fn store(server: &MockServer) -> S3ObjectStore {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("AKID", "SECRET", None, None, "test"))
            .endpoint_url(server.uri())
            .force_path_style(true)
            .build();
        S3ObjectStore::with_client(Client::from_conf(config), "bucket")
    }

    #[tokio::test]
    async fn test_put_is_signed_and_sends_headers() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/bucket/charts/h100/a.png"))
            .and(header_exists("authorization"))
            .and(header("content-type", "image/png"))
            .and(header("cache-control", "max-age=600"))
            .and(header("x-amz-acl", "public-read"))
            .and(header("x-amz-meta-company", "H100"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        store(&server)
            .put("charts/h100/a.png", vec![1, 2, 3], &meta())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_put_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(
                ResponseTemplate::new(403)
                    .insert_header("content-type", "application/xml")
                    .set_body_string(ACCESS_DENIED),
            )
            .mount(&server)
            .await;

        let err = store(&server)
            .put("charts/h100/a.png", vec![], &meta())
            .await
            .unwrap_err();
        match err {
            UploadError::S3 { key, message } => {
                assert_eq!(key, "charts/h100/a.png");
                assert!(message.contains("AccessDenied"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_from_config_keeps_bucket() {
        let mut config = UploadConfig::new("treasury-charts");
        config.endpoint_url = Some("http://localhost:9000".to_string());
        let store = S3ObjectStore::from_config(&config).await;
        assert_eq!(store.bucket(), "treasury-charts");
    }
}

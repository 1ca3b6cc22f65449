//! AWS S3 client wrapper bound to a single bucket

use crate::error::StoreError;
use crate::s3::store::ObjectStore;
use async_trait::async_trait;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::config::{BehaviorVersion, Builder, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use std::time::Duration;

/// Connection settings for an S3-compatible endpoint
#[derive(Clone, Default)]
pub struct S3ClientConfig {
    /// Custom endpoint (R2, MinIO, ...); `None` or empty uses the AWS default
    pub endpoint_url: Option<String>,
    /// Use `endpoint/bucket/key` addressing instead of virtual hosts
    pub force_path_style: bool,
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub bucket: String,
    /// Upper bound for a whole SDK operation, retries included
    pub operation_timeout: Option<Duration>,
}

impl S3ClientConfig {
    /// Static-credential configuration for `bucket`
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
        bucket: impl Into<String>,
        endpoint_url: impl Into<String>,
    ) -> Self {
        Self {
            endpoint_url: Some(endpoint_url.into()),
            force_path_style: false,
            region: Some(region.into()),
            access_key_id: Some(access_key_id.into()),
            secret_access_key: Some(secret_access_key.into()),
            bucket: bucket.into(),
            operation_timeout: None,
        }
    }
}

impl std::fmt::Debug for S3ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ClientConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("force_path_style", &self.force_path_style)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("bucket", &self.bucket)
            .field("operation_timeout", &self.operation_timeout)
            .finish()
    }
}

/// S3 client wrapper with high-level operations on one bucket
#[derive(Debug, Clone)]
pub struct S3Client {
    client: Client,
    bucket: String,
}

impl S3Client {
    /// Build a client from explicit settings.
    ///
    /// Never fails: bad credentials, regions or endpoints show up as errors on
    /// the first request.
    pub fn with_config(config: S3ClientConfig) -> Self {
        let builder = aws_sdk_s3::Config::builder().behavior_version(BehaviorVersion::latest());
        Self::build(builder, config)
    }

    /// Build a client on top of the default AWS credential chain
    /// (environment, profiles, instance roles), with `config` applied on top.
    pub async fn from_env(config: S3ClientConfig) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::build(Builder::from(&shared), config)
    }

    fn build(mut builder: Builder, config: S3ClientConfig) -> Self {
        if let Some(region) = config.region.filter(|r| !r.is_empty()) {
            builder = builder.region(Region::new(region));
        }

        if let Some(endpoint) = config.endpoint_url.as_deref().filter(|e| !e.is_empty()) {
            builder = builder.endpoint_url(endpoint);
        }

        if let (Some(access_key), Some(secret_key)) =
            (config.access_key_id, config.secret_access_key)
        {
            builder = builder.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "image-uploader",
            ));
        }

        if let Some(timeout) = config.operation_timeout {
            builder = builder.timeout_config(
                TimeoutConfig::builder().operation_timeout(timeout).build(),
            );
        }

        let s3_config = builder.force_path_style(config.force_path_style).build();

        tracing::debug!(
            "Configured S3 client: bucket={}, region={:?}, endpoint={:?}",
            config.bucket,
            s3_config.region(),
            config.endpoint_url
        );

        Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket,
        }
    }

    /// Bucket all operations go to
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Create the configured bucket
    pub async fn create_bucket(&self) -> Result<(), StoreError> {
        self.client
            .create_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("CreateBucket {} failed: {}", self.bucket, DisplayErrorContext(&e));
                StoreError::request("CreateBucket", &self.bucket, e)
            })?;

        Ok(())
    }

    /// Check whether an object exists (HEAD request)
    pub async fn object_exists(&self, key: &str) -> Result<bool, StoreError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(StoreError::request("HeadObject", key, e)),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("PutObject {} failed: {}", key, DisplayErrorContext(&e));
                StoreError::request("PutObject", key, e)
            })?;

        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, StoreError> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    StoreError::NotFound {
                        key: key.to_string(),
                    }
                } else {
                    tracing::warn!("GetObject {} failed: {}", key, DisplayErrorContext(&e));
                    StoreError::request("GetObject", key, e)
                }
            })?;

        // The body stream is consumed here and dropped on error.
        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StoreError::request("GetObject", key, e))?;

        Ok(data.into_bytes())
    }

    async fn delete_object(&self, key: &str) -> Result<(), StoreError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("DeleteObject {} failed: {}", key, DisplayErrorContext(&e));
                StoreError::request("DeleteObject", key, e)
            })?;

        Ok(())
    }
}

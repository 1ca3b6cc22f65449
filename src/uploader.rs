//! Image uploader: put/get/delete images in a bucket and hand out public URLs

use crate::error::{FetchError, Result, UploadError};
use crate::s3::{ObjectStore, PublicUrl, S3Client, S3ClientConfig};
use crate::sniff;
use bytes::Bytes;
use reqwest::StatusCode;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Everything needed to build an [`ImageUploader`] talking to S3
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    pub s3: S3ClientConfig,
    /// Base of the public URLs returned by uploads
    pub public_url: PublicUrl,
    /// Timeout for downloading remote sources in [`ImageUploader::upload_from_url`]
    pub request_timeout: Option<Duration>,
}

/// Uploads images to an object store.
///
/// Holds no mutable state; share it between tasks behind an `Arc`.
#[derive(Debug)]
pub struct ImageUploader<S = S3Client> {
    store: S,
    public_url: PublicUrl,
    http: std::result::Result<reqwest::Client, String>,
}

impl ImageUploader<S3Client> {
    /// Create an uploader for the configured bucket.
    ///
    /// Construction never fails. Invalid credentials or endpoints surface on
    /// the first store call.
    pub fn new(config: UploaderConfig) -> Self {
        Self {
            store: S3Client::with_config(config.s3),
            public_url: config.public_url,
            http: build_http_client(config.request_timeout),
        }
    }
}

impl<S: ObjectStore> ImageUploader<S> {
    /// Create an uploader over any object store
    pub fn with_store(store: S, public_url: PublicUrl) -> Self {
        Self {
            store,
            public_url,
            http: build_http_client(None),
        }
    }

    /// Replace the HTTP client used for remote sources with one using `timeout`
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.http = build_http_client(Some(timeout));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn public_url(&self) -> &PublicUrl {
        &self.public_url
    }

    /// Read `reader` to the end and store it under `key`.
    ///
    /// The content type is sniffed from the payload. Returns the public URL of
    /// the object.
    pub async fn upload<R>(&self, mut reader: R, key: &str) -> Result<String>
    where
        R: AsyncRead + Unpin,
    {
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .await
            .map_err(UploadError::Read)?;

        let data = Bytes::from(data);
        let content_type = sniff::detect_content_type(&data);
        let size = data.len();

        tracing::debug!("Uploading {} ({} bytes, {})", key, size, content_type);

        self.store.put_object(key, data, content_type).await?;

        let url = self.public_url.url_for(key);
        tracing::info!("Uploaded {} ({} bytes) to {}", key, size, url);

        Ok(url)
    }

    /// Download `source` and store the body under `key`.
    ///
    /// Only a `200 OK` answer is uploaded; anything else is a
    /// [`FetchError::Status`] and nothing is written. A timeout while the body
    /// is downloading is a [`FetchError::Request`]; other body faults are
    /// [`UploadError::Read`].
    pub async fn upload_from_url(&self, source: &str, key: &str) -> Result<String> {
        let http = self
            .http
            .as_ref()
            .map_err(|e| FetchError::ClientUnavailable(e.clone()))?;

        tracing::debug!("Downloading {} for {}", source, key);

        let response = http
            .get(source)
            .send()
            .await
            .map_err(|e| FetchError::Request {
                url: source.to_string(),
                source: e,
            })?;

        if response.status() != StatusCode::OK {
            tracing::warn!("Download of {} returned {}", source, response.status());
            return Err(FetchError::Status {
                url: source.to_string(),
                status: response.status().as_u16(),
            }
            .into());
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                UploadError::from(FetchError::Request {
                    url: source.to_string(),
                    source: e,
                })
            } else {
                UploadError::Read(std::io::Error::other(e))
            }
        })?;

        self.upload(&body[..], key).await
    }

    /// Fetch the object stored under `key`
    pub async fn fetch(&self, key: &str) -> Result<Bytes> {
        let data = self.store.get_object(key).await?;
        tracing::debug!("Fetched {} ({} bytes)", key, data.len());
        Ok(data)
    }

    /// Delete the object stored under `key`. Deleting a missing key succeeds.
    pub async fn delete(&self, key: &str) -> Result<()> {
        self.store.delete_object(key).await?;
        tracing::info!("Deleted {}", key);
        Ok(())
    }
}

fn build_http_client(timeout: Option<Duration>) -> std::result::Result<reqwest::Client, String> {
    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("image-uploader/", env!("CARGO_PKG_VERSION")));

    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    builder.build().map_err(|e| {
        tracing::warn!("HTTP client setup failed, upload by URL unavailable: {}", e);
        e.to_string()
    })
}

//! Error types returned by the uploader and the object stores

use thiserror::Error;

/// Boxed error coming out of the AWS SDK or another store backend
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of a put/get/delete call against the object store
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store reported that the key does not exist
    #[error("object not found: {key}")]
    NotFound { key: String },

    /// Any other failure reported by the store client (auth, transport, service)
    #[error("{operation} failed for key {key}: {source}")]
    Request {
        operation: &'static str,
        key: String,
        #[source]
        source: BoxError,
    },
}

impl StoreError {
    pub fn request(operation: &'static str, key: &str, source: impl Into<BoxError>) -> Self {
        StoreError::Request {
            operation,
            key: key.to_string(),
            source: source.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Failure while downloading a remote source for upload-by-URL
#[derive(Error, Debug)]
pub enum FetchError {
    /// The HTTP client could not be set up when the uploader was built
    #[error("HTTP client unavailable: {0}")]
    ClientUnavailable(String),

    /// The request could not be sent or the transport failed
    #[error("failed to download image from URL: {url}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The source answered with something other than 200 OK
    #[error("failed to download image from URL: {url} (status {status})")]
    Status { url: String, status: u16 },
}

impl FetchError {
    /// The source URL this error refers to, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            FetchError::ClientUnavailable(_) => None,
            FetchError::Request { url, .. } | FetchError::Status { url, .. } => Some(url),
        }
    }
}

/// Error returned by every [`crate::ImageUploader`] operation
#[derive(Error, Debug)]
pub enum UploadError {
    /// The payload stream could not be read to the end
    #[error("failed to read image data: {0}")]
    Read(#[source] std::io::Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl UploadError {
    /// True when the store said the object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, UploadError::Store(e) if e.is_not_found())
    }
}

pub type Result<T> = std::result::Result<T, UploadError>;

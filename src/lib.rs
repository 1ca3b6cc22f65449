//! Image uploader library
//!
//! Moves images into and out of an S3-compatible bucket: upload from a
//! reader or a remote URL, fetch, delete. Uploads return the public URL the
//! object is served under, which assumes the bucket allows public reads.

pub mod error;
pub mod s3;
pub mod settings;
pub mod sniff;
pub mod uploader;

pub use error::{FetchError, StoreError, UploadError};
pub use uploader::{ImageUploader, UploaderConfig};

//! S3 storage module
//!
//! This module provides the object store side of the uploader:
//! - [`client::S3Client`] - aws-sdk-s3 wrapper bound to one bucket
//! - [`store::ObjectStore`] - put/get/delete seam, with [`store::MemoryStore`]
//! - [`types`] - public URL template and stored object types

pub mod client;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use client::{S3Client, S3ClientConfig};
pub use store::{MemoryStore, ObjectStore};
pub use types::{PublicUrl, StoredObject};

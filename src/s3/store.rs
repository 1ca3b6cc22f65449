//! Object store abstraction used by the uploader
//!
//! [`crate::s3::S3Client`] is the production backend; [`MemoryStore`] keeps
//! objects in process memory for tests and dry runs.

use crate::error::StoreError;
use crate::s3::types::StoredObject;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Put/get/delete against a single bucket
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `body` under `key`, overwriting any existing object
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StoreError>;

    /// Read the whole object stored under `key`
    async fn get_object(&self, key: &str) -> Result<Bytes, StoreError>;

    /// Remove `key`; succeeds when the key does not exist
    async fn delete_object(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory object store
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, StoredObject>>,
    puts: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of put calls received so far
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Content type the object was stored with
    pub async fn content_type(&self, key: &str) -> Option<String> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|o| o.content_type.clone())
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, StoreError> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|o| o.body.clone())
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })
    }

    async fn delete_object(&self, key: &str) -> Result<(), StoreError> {
        self.objects.write().await.remove(key);
        Ok(())
    }
}

//! Blob store abstraction
//!
//! The export pipeline only needs [`BlobStore::put`]. The remaining
//! operations back the `status`, `fetch` and `purge` commands.

use crate::domain::StorageError;
use async_trait::async_trait;
use std::path::Path;

/// Result type for blob store operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Content type of a compressed artifact
pub const CONTENT_TYPE_GZIP: &str = "application/gzip";

/// Content type of a plain JSON Lines artifact
pub const CONTENT_TYPE_NDJSON: &str = "application/x-ndjson";

/// An object listed from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Key relative to the configured prefix
    pub key: String,

    /// Object size in bytes
    pub size: u64,
}

/// Object storage collaborator
///
/// Keys passed in and returned are relative to the store's configured
/// prefix. Implementations apply the prefix themselves.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Human-readable location, e.g. `s3://bucket/prefix`
    fn describe(&self) -> String;

    /// Check that the store is reachable
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConnectionFailed` if the store cannot be reached.
    async fn test_connection(&self) -> StorageResult<()>;

    /// Upload a local file under `key`
    ///
    /// Returns only after the store acknowledged the whole object. Uploading
    /// the same key again overwrites it.
    async fn put(&self, local: &Path, key: &str, content_type: &str) -> StorageResult<()>;

    /// List objects whose key starts with `prefix`, sorted by key
    async fn list(&self, prefix: &str) -> StorageResult<Vec<ObjectInfo>>;

    /// Download `key` into a local file, returning the byte count
    async fn get(&self, key: &str, local: &Path) -> StorageResult<u64>;

    /// Delete one object
    async fn delete(&self, key: &str) -> StorageResult<()>;
}

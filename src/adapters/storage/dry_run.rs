//! Blob store used for dry runs
//!
//! Accepts every upload without sending anything.

use super::traits::{BlobStore, ObjectInfo, StorageResult};
use crate::domain::StorageError;
use async_trait::async_trait;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct DryRunBlobStore;

#[async_trait]
impl BlobStore for DryRunBlobStore {
    fn describe(&self) -> String {
        "dry-run (no uploads)".to_string()
    }

    async fn test_connection(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn put(&self, local: &Path, key: &str, content_type: &str) -> StorageResult<()> {
        let size = tokio::fs::metadata(local)
            .await
            .map(|m| m.len())
            .map_err(|e| StorageError::PutFailed {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        info!(
            key = %key,
            bytes = size,
            content_type = %content_type,
            "Dry run: would upload {}",
            local.display()
        );
        Ok(())
    }

    async fn list(&self, _prefix: &str) -> StorageResult<Vec<ObjectInfo>> {
        Ok(Vec::new())
    }

    async fn get(&self, key: &str, _local: &Path) -> StorageResult<u64> {
        Err(StorageError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        info!(key = %key, "Dry run: would delete");
        Ok(())
    }
}

//! Blob store factory

use super::dry_run::DryRunBlobStore;
use super::local::LocalBlobStore;
use super::s3::S3BlobStore;
use super::traits::BlobStore;
use crate::config::{ExporterConfig, StorageTarget};
use crate::domain::{ExporterError, Result};
use std::sync::Arc;

/// Create the blob store selected by `storage.target`
///
/// Dry runs get a [`DryRunBlobStore`] regardless of the target.
///
/// # Errors
///
/// Returns a configuration error if the local target has no root, or a
/// storage error if the S3 client cannot be built.
pub async fn create_blob_store(config: &ExporterConfig) -> Result<Arc<dyn BlobStore>> {
    if config.export.dry_run {
        tracing::info!("Dry run enabled, uploads are skipped");
        return Ok(Arc::new(DryRunBlobStore));
    }

    match config.storage.target {
        StorageTarget::S3 => {
            let store = S3BlobStore::new(&config.storage).await?;
            Ok(Arc::new(store))
        }
        StorageTarget::Local => {
            let root = config.storage.local_root.clone().ok_or_else(|| {
                ExporterError::Configuration(
                    "storage.local_root is required when storage.target = 'local'".to_string(),
                )
            })?;
            tracing::info!(root = %root.display(), "Using local blob store");
            Ok(Arc::new(
                LocalBlobStore::new(root).with_prefix(config.storage.prefix.clone()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_target() {
        let root = TempDir::new().unwrap();
        let config = parse_config(&format!(
            "[storage]\ntarget = \"local\"\nlocal_root = \"{}\"\n",
            root.path().display()
        ))
        .unwrap();

        let store = create_blob_store(&config).await.unwrap();
        assert!(store.describe().starts_with("file://"));
    }

    #[tokio::test]
    async fn test_dry_run_wins() {
        let mut config = parse_config("[storage]\nbucket = \"segments\"\n").unwrap();
        config.export.dry_run = true;

        let store = create_blob_store(&config).await.unwrap();
        assert!(store.describe().starts_with("dry-run"));
    }
}

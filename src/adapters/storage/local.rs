//! Directory-backed blob store
//!
//! Keys map to relative paths under a root directory. Used for offline runs
//! and by the integration tests.

use super::traits::{BlobStore, ObjectInfo, StorageResult};
use crate::config::schema::prefixed_key;
use crate::domain::StorageError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    prefix: Option<String>,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            prefix: None,
        }
    }

    pub fn with_prefix(mut self, prefix: Option<String>) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_key(&self, key: &str) -> String {
        prefixed_key(self.prefix.as_deref(), key)
    }

    fn object_path(&self, full_key: &str) -> PathBuf {
        full_key
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn describe(&self) -> String {
        let location = self.object_path(&self.full_key(""));
        format!("file://{}", location.display())
    }

    async fn test_connection(&self) -> StorageResult<()> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            StorageError::ConnectionFailed(format!("{}: {}", self.root.display(), e))
        })
    }

    async fn put(&self, local: &Path, key: &str, _content_type: &str) -> StorageResult<()> {
        let full_key = self.full_key(key);
        let target = self.object_path(&full_key);
        let put_failed = |e: std::io::Error| StorageError::PutFailed {
            key: full_key.clone(),
            message: e.to_string(),
        };

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(put_failed)?;
        }
        tokio::fs::copy(local, &target).await.map_err(put_failed)?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<ObjectInfo>> {
        let root = self.root.clone();
        let store_prefix = self.full_key("");
        let full_prefix = self.full_key(prefix);

        let listing = tokio::task::spawn_blocking(move || -> std::result::Result<Vec<ObjectInfo>, String> {
            let mut objects = Vec::new();
            if !root.exists() {
                return Ok(objects);
            }
            for entry in WalkDir::new(&root) {
                let entry = entry.map_err(|e| e.to_string())?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let Ok(relative) = entry.path().strip_prefix(&root) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if !key.starts_with(&full_prefix) {
                    continue;
                }
                let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                objects.push(ObjectInfo {
                    key: key.strip_prefix(&store_prefix).unwrap_or(&key).to_string(),
                    size,
                });
            }
            objects.sort_by(|a, b| a.key.cmp(&b.key));
            Ok(objects)
        })
        .await
        .map_err(|e| StorageError::ListFailed {
            prefix: prefix.to_string(),
            message: e.to_string(),
        })?;

        listing.map_err(|message| StorageError::ListFailed {
            prefix: prefix.to_string(),
            message,
        })
    }

    async fn get(&self, key: &str, local: &Path) -> StorageResult<u64> {
        let full_key = self.full_key(key);
        let source = self.object_path(&full_key);
        if !source.is_file() {
            return Err(StorageError::NotFound(full_key));
        }
        tokio::fs::copy(&source, local)
            .await
            .map_err(|e| StorageError::GetFailed {
                key: full_key,
                message: e.to_string(),
            })
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let full_key = self.full_key(key);
        match tokio::fs::remove_file(self.object_path(&full_key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(full_key))
            }
            Err(e) => Err(StorageError::DeleteFailed {
                key: full_key,
                message: e.to_string(),
            }),
        }
    }
}

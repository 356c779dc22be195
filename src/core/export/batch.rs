//! Batch accumulation and rotation
//!
//! [`BatchRotator`] writes records of one file into JSON Lines artifacts,
//! flushes periodically, and at every batch boundary finalizes the current
//! artifact (flush, optional compression, upload) before opening the next.
//!
//! ```text
//! WRITING -> FLUSHING -> (COMPRESSING) -> UPLOADING -> ROTATING -> WRITING
//!                                                  \-> DONE (end of stream)
//! ```

use crate::adapters::compression::Compressor;
use crate::adapters::storage::{BlobStore, CONTENT_TYPE_GZIP, CONTENT_TYPE_NDJSON};
use crate::config::ExportConfig;
use crate::domain::{ExporterError, Record, Result, SourceFile};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};

/// Rotator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotatorState {
    Writing,
    Flushing,
    Compressing,
    Uploading,
    Rotating,
    Done,
}

impl fmt::Display for RotatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RotatorState::Writing => "WRITING",
            RotatorState::Flushing => "FLUSHING",
            RotatorState::Compressing => "COMPRESSING",
            RotatorState::Uploading => "UPLOADING",
            RotatorState::Rotating => "ROTATING",
            RotatorState::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// Configuration for batch rotation
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Records per batch; `None` means one unbounded batch per file
    pub batch_limit: Option<usize>,
    /// Records between writer flushes
    pub flush_interval: usize,
    /// Directory for local artifacts
    pub temp_dir: PathBuf,
    /// Keep local artifacts after upload
    pub keep_artifacts: bool,
}

impl BatchConfig {
    pub fn from_export_config(config: &ExportConfig) -> Self {
        Self {
            batch_limit: config.batch_limit(),
            flush_interval: config.flush_interval.max(1),
            temp_dir: config.temp_dir.clone(),
            keep_artifacts: config.keep_artifacts,
        }
    }
}

/// Acknowledged upload of one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReceipt {
    pub batch_index: usize,
    pub key: String,
    pub records: usize,
    pub uploaded_bytes: u64,
    pub compressed: bool,
    /// Hex SHA-256 of the uploaded bytes
    pub sha256: String,
}

/// Accumulates records into batches and hands finalized artifacts to the
/// compressor and the blob store
///
/// One rotator serves exactly one source file. Any compression or upload
/// failure is returned immediately and the rotator must not be used again.
pub struct BatchRotator {
    file: SourceFile,
    config: BatchConfig,
    store: Arc<dyn BlobStore>,
    compressor: Option<Arc<dyn Compressor>>,
    stamp: String,
    state: RotatorState,
    batch_index: usize,
    count: usize,
    artifact: PathBuf,
    writer: Option<BufWriter<tokio::fs::File>>,
    receipts: Vec<BatchReceipt>,
}

impl BatchRotator {
    /// Open the first artifact of a file
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the temp directory or the artifact cannot be
    /// created.
    pub async fn open(
        file: SourceFile,
        config: BatchConfig,
        store: Arc<dyn BlobStore>,
        compressor: Option<Arc<dyn Compressor>>,
    ) -> Result<Self> {
        tokio::fs::create_dir_all(&config.temp_dir).await.map_err(|e| {
            ExporterError::Io(format!(
                "Failed to create temp directory {}: {}",
                config.temp_dir.display(),
                e
            ))
        })?;

        let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S").to_string();
        let artifact = artifact_path(&config.temp_dir, file.base_name(), &stamp, 0);
        let writer = create_writer(&artifact).await?;

        Ok(Self {
            file,
            config,
            store,
            compressor,
            stamp,
            state: RotatorState::Writing,
            batch_index: 0,
            count: 0,
            artifact,
            writer: Some(writer),
            receipts: Vec::new(),
        })
    }

    pub fn state(&self) -> RotatorState {
        self.state
    }

    /// Index of the batch currently being written
    pub fn batch_index(&self) -> usize {
        self.batch_index
    }

    /// Local path of the artifact currently being written
    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    /// Append one record, rotating when it completes a batch
    ///
    /// # Errors
    ///
    /// Returns an I/O error on write failure, or the compression/upload error
    /// of the batch this record completed.
    pub async fn write_record(&mut self, record: &Record) -> Result<()> {
        let mut line = record.to_json_line()?;
        line.push('\n');

        let writer = self.writer.as_mut().ok_or_else(|| {
            ExporterError::Other(format!("Batch writer for {} is closed", self.file))
        })?;
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| io_error("write", &self.artifact, e))?;
        self.count += 1;

        if self.count % self.config.flush_interval == 0 {
            writer
                .flush()
                .await
                .map_err(|e| io_error("flush", &self.artifact, e))?;
        }

        if self.config.batch_limit.is_some_and(|limit| self.count >= limit) {
            self.finalize_batch().await?;
            self.rotate().await?;
        }

        Ok(())
    }

    /// Finalize the trailing batch and return every receipt of the file
    ///
    /// An empty trailing artifact is removed without being uploaded.
    pub async fn finish(mut self) -> Result<Vec<BatchReceipt>> {
        if self.count > 0 {
            self.finalize_batch().await?;
        } else {
            self.writer = None;
            remove_artifact(&self.artifact).await;
        }

        self.transition(RotatorState::Done);
        Ok(self.receipts)
    }

    async fn finalize_batch(&mut self) -> Result<()> {
        self.transition(RotatorState::Flushing);
        if let Some(mut writer) = self.writer.take() {
            writer
                .flush()
                .await
                .map_err(|e| io_error("flush", &self.artifact, e))?;
            writer
                .shutdown()
                .await
                .map_err(|e| io_error("close", &self.artifact, e))?;
        }

        let mut upload_path = self.artifact.clone();
        let mut compressed_extension = None;
        if let Some(compressor) = self.compressor.clone() {
            self.transition(RotatorState::Compressing);
            upload_path = compressor.compress(&self.artifact).await.map_err(|e| {
                self.log_left_behind(&e);
                e
            })?;
            if upload_path != self.artifact {
                compressed_extension = Some(compressor.extension().to_string());
            }
        }

        self.transition(RotatorState::Uploading);
        let compressed = compressed_extension.is_some();
        let key = self
            .file
            .batch_key(self.batch_index, compressed_extension.as_deref());
        let content_type = if compressed {
            CONTENT_TYPE_GZIP
        } else {
            CONTENT_TYPE_NDJSON
        };
        let (uploaded_bytes, sha256) = file_digest(&upload_path).await?;

        if let Err(e) = self.store.put(&upload_path, &key, content_type).await {
            let err = ExporterError::Upload(e);
            self.log_left_behind(&err);
            return Err(err);
        }

        tracing::info!(
            file = %self.file,
            batch_index = self.batch_index,
            key = %key,
            records = self.count,
            bytes = uploaded_bytes,
            compressed,
            "Batch uploaded"
        );

        self.receipts.push(BatchReceipt {
            batch_index: self.batch_index,
            key,
            records: self.count,
            uploaded_bytes,
            compressed,
            sha256,
        });

        if !self.config.keep_artifacts {
            remove_artifact(&self.artifact).await;
            if upload_path != self.artifact {
                remove_artifact(&upload_path).await;
            }
        }

        Ok(())
    }

    async fn rotate(&mut self) -> Result<()> {
        self.transition(RotatorState::Rotating);
        self.batch_index += 1;
        self.count = 0;
        self.artifact = artifact_path(
            &self.config.temp_dir,
            self.file.base_name(),
            &self.stamp,
            self.batch_index,
        );
        self.writer = Some(create_writer(&self.artifact).await?);
        self.transition(RotatorState::Writing);
        Ok(())
    }

    fn transition(&mut self, next: RotatorState) {
        tracing::trace!(
            file = %self.file,
            batch_index = self.batch_index,
            from = %self.state,
            to = %next,
            "Rotator transition"
        );
        self.state = next;
    }

    fn log_left_behind(&self, error: &ExporterError) {
        tracing::warn!(
            file = %self.file,
            batch_index = self.batch_index,
            artifact = %self.artifact.display(),
            error = %error,
            "Batch failed, local artifact left in place"
        );
    }
}

/// `{temp_dir}/{base}-{stamp}-batch-{n}.json`
pub fn artifact_path(temp_dir: &Path, base_name: &str, stamp: &str, batch_index: usize) -> PathBuf {
    temp_dir.join(format!("{base_name}-{stamp}-batch-{batch_index}.json"))
}

async fn create_writer(path: &Path) -> Result<BufWriter<tokio::fs::File>> {
    let file = tokio::fs::File::create(path)
        .await
        .map_err(|e| io_error("create", path, e))?;
    Ok(BufWriter::new(file))
}

async fn remove_artifact(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::debug!(artifact = %path.display(), error = %e, "Could not remove artifact");
    }
}

/// Size and hex SHA-256 of a file
async fn file_digest(path: &Path) -> Result<(u64, String)> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| io_error("open", path, e))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 64 * 1024];
    let mut total = 0u64;

    loop {
        let read = file
            .read(&mut buffer)
            .await
            .map_err(|e| io_error("read", path, e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
        total += read as u64;
    }

    Ok((total, format!("{:x}", hasher.finalize())))
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> ExporterError {
    ExporterError::Io(format!("Failed to {} {}: {}", action, path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::compression::GzipCompressor;
    use crate::adapters::storage::{LocalBlobStore, ObjectInfo, StorageResult};
    use crate::domain::{HeaderSchema, StorageError};
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct RejectingStore;

    #[async_trait]
    impl BlobStore for RejectingStore {
        fn describe(&self) -> String {
            "rejecting".to_string()
        }
        async fn test_connection(&self) -> StorageResult<()> {
            Ok(())
        }
        async fn put(&self, _local: &Path, key: &str, _ct: &str) -> StorageResult<()> {
            Err(StorageError::PutFailed {
                key: key.to_string(),
                message: "access denied".to_string(),
            })
        }
        async fn list(&self, _prefix: &str) -> StorageResult<Vec<ObjectInfo>> {
            Ok(Vec::new())
        }
        async fn get(&self, key: &str, _local: &Path) -> StorageResult<u64> {
            Err(StorageError::NotFound(key.to_string()))
        }
        async fn delete(&self, _key: &str) -> StorageResult<()> {
            Ok(())
        }
    }

    struct Fixture {
        temp: TempDir,
        out: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                temp: TempDir::new().unwrap(),
                out: TempDir::new().unwrap(),
            }
        }

        fn config(&self, batch_limit: Option<usize>) -> BatchConfig {
            BatchConfig {
                batch_limit,
                flush_interval: 100,
                temp_dir: self.temp.path().to_path_buf(),
                keep_artifacts: false,
            }
        }

        fn store(&self) -> Arc<dyn BlobStore> {
            Arc::new(LocalBlobStore::new(self.out.path()))
        }

        fn leftovers(&self) -> usize {
            std::fs::read_dir(self.temp.path()).unwrap().count()
        }
    }

    fn record(i: usize) -> Record {
        let schema = HeaderSchema::new(vec!["id".to_string(), "name".to_string()]).unwrap();
        let id = i.to_string();
        Record::from_fields(&schema, [id.as_str(), "row"]).unwrap()
    }

    fn source() -> SourceFile {
        SourceFile::new("data/segments.sfm").unwrap()
    }

    async fn write_all(rotator: &mut BatchRotator, n: usize) {
        for i in 0..n {
            rotator.write_record(&record(i)).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_rotation_sizes_and_keys() {
        let fx = Fixture::new();
        let mut rotator = BatchRotator::open(source(), fx.config(Some(500)), fx.store(), None)
            .await
            .unwrap();
        write_all(&mut rotator, 1200).await;
        let receipts = rotator.finish().await.unwrap();

        let sizes: Vec<usize> = receipts.iter().map(|r| r.records).collect();
        let keys: Vec<&str> = receipts.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(sizes, [500, 500, 200]);
        assert_eq!(
            keys,
            [
                "segments/batch-0.json",
                "segments/batch-1.json",
                "segments/batch-2.json"
            ]
        );

        let last = std::fs::read_to_string(fx.out.path().join("segments/batch-2.json")).unwrap();
        assert_eq!(last.lines().count(), 200);
        assert!(last.starts_with("{\"id\":\"1000\",\"name\":\"row\"}\n"));
        assert_eq!(fx.leftovers(), 0);
    }

    #[tokio::test]
    async fn test_exact_boundary_has_no_trailing_batch() {
        let fx = Fixture::new();
        let mut rotator = BatchRotator::open(source(), fx.config(Some(250)), fx.store(), None)
            .await
            .unwrap();
        write_all(&mut rotator, 500).await;
        assert_eq!(rotator.batch_index(), 2);

        let receipts = rotator.finish().await.unwrap();
        assert_eq!(receipts.len(), 2);
        assert_eq!(fx.leftovers(), 0);
    }

    #[tokio::test]
    async fn test_unbounded_batch() {
        let fx = Fixture::new();
        let mut rotator = BatchRotator::open(source(), fx.config(None), fx.store(), None)
            .await
            .unwrap();
        write_all(&mut rotator, 2500).await;
        assert_eq!(rotator.state(), RotatorState::Writing);

        let receipts = rotator.finish().await.unwrap();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].records, 2500);
        assert_eq!(receipts[0].key, "segments/batch-0.json");
    }

    #[tokio::test]
    async fn test_empty_stream_uploads_nothing() {
        let fx = Fixture::new();
        let rotator = BatchRotator::open(source(), fx.config(Some(10)), fx.store(), None)
            .await
            .unwrap();
        assert!(rotator.finish().await.unwrap().is_empty());
        assert_eq!(fx.leftovers(), 0);
    }

    #[tokio::test]
    async fn test_compressed_batches_use_gz_keys() {
        let fx = Fixture::new();
        let compressor: Arc<dyn Compressor> = Arc::new(GzipCompressor::new());
        let mut rotator =
            BatchRotator::open(source(), fx.config(Some(300)), fx.store(), Some(compressor))
                .await
                .unwrap();
        write_all(&mut rotator, 400).await;
        let receipts = rotator.finish().await.unwrap();

        assert_eq!(receipts[0].key, "segments/batch-0.json.gz");
        assert!(receipts.iter().all(|r| r.compressed));
        assert!(fx.out.path().join("segments/batch-1.json.gz").is_file());
        assert_eq!(fx.leftovers(), 0);
    }

    #[tokio::test]
    async fn test_receipt_digest_matches_uploaded_bytes() {
        let fx = Fixture::new();
        let mut rotator = BatchRotator::open(source(), fx.config(None), fx.store(), None)
            .await
            .unwrap();
        write_all(&mut rotator, 3).await;
        let receipt = rotator.finish().await.unwrap().remove(0);

        let uploaded = std::fs::read(fx.out.path().join(&receipt.key)).unwrap();
        assert_eq!(receipt.uploaded_bytes, uploaded.len() as u64);
        assert_eq!(receipt.sha256, format!("{:x}", Sha256::digest(&uploaded)));
    }

    #[tokio::test]
    async fn test_upload_failure_aborts_and_keeps_artifact() {
        let fx = Fixture::new();
        let mut rotator =
            BatchRotator::open(source(), fx.config(Some(2)), Arc::new(RejectingStore), None)
                .await
                .unwrap();
        rotator.write_record(&record(0)).await.unwrap();
        let err = rotator.write_record(&record(1)).await.unwrap_err();

        assert!(matches!(err, ExporterError::Upload(_)));
        assert_eq!(rotator.state(), RotatorState::Uploading);
        assert!(rotator.artifact().is_file());
    }

    #[test]
    fn test_artifact_path() {
        assert_eq!(
            artifact_path(Path::new("/tmp/sfm"), "run", "20240101-120000", 3),
            PathBuf::from("/tmp/sfm/run-20240101-120000-batch-3.json")
        );
    }
}

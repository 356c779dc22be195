//! End-to-end tests for the export pipeline
//!
//! These tests drive `ExportCoordinator` against a local directory store and
//! in-test stores that record or reject uploads.

use async_trait::async_trait;
use sfm_exporter::adapters::compression::Compressor;
use sfm_exporter::adapters::storage::{BlobStore, LocalBlobStore, ObjectInfo, StorageResult};
use sfm_exporter::config::{parse_config, ExporterConfig};
use sfm_exporter::core::export::{ExportCoordinator, FileStatus};
use sfm_exporter::core::state::{ExportState, ExportStateTracker};
use sfm_exporter::domain::{ExporterError, Result, SourceFile, StorageError};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::watch;

/// Stores a copy of every upload in memory, optionally failing some keys
#[derive(Default)]
struct RecordingStore {
    uploads: Mutex<Vec<(String, String, Vec<u8>)>>,
    fail_keys_with: Option<String>,
}

impl RecordingStore {
    fn failing_on(prefix: &str) -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            fail_keys_with: Some(prefix.to_string()),
        }
    }

    fn keys(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(key, _, _)| key.clone())
            .collect()
    }

    fn body(&self, key: &str) -> Vec<u8> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .find(|(k, _, _)| k == key)
            .map(|(_, _, body)| body.clone())
            .unwrap()
    }
}

#[async_trait]
impl BlobStore for RecordingStore {
    fn describe(&self) -> String {
        "memory://".to_string()
    }

    async fn test_connection(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn put(&self, local: &Path, key: &str, content_type: &str) -> StorageResult<()> {
        if let Some(prefix) = &self.fail_keys_with {
            if key.starts_with(prefix.as_str()) {
                return Err(StorageError::PutFailed {
                    key: key.to_string(),
                    message: "access denied".to_string(),
                });
            }
        }
        let body = std::fs::read(local).unwrap();
        self.uploads
            .lock()
            .unwrap()
            .push((key.to_string(), content_type.to_string(), body));
        Ok(())
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

/// Always produces an output larger than its input
struct InflatingCompressor;

#[async_trait]
impl Compressor for InflatingCompressor {
    fn extension(&self) -> &str {
        "gz"
    }

    async fn compress(&self, path: &Path) -> Result<PathBuf> {
        let mut bytes = std::fs::read(path)?;
        bytes.extend_from_slice(&[0u8; 64]);
        let compressed = PathBuf::from(format!("{}.gz", path.display()));
        std::fs::write(&compressed, bytes)?;
        Ok(sfm_exporter::adapters::compression::keep_if_smaller(path, &compressed)?)
    }
}

/// Always fails
struct BrokenCompressor;

#[async_trait]
impl Compressor for BrokenCompressor {
    fn extension(&self) -> &str {
        "gz"
    }

    async fn compress(&self, _path: &Path) -> Result<PathBuf> {
        Err(ExporterError::Compression("codec unavailable".to_string()))
    }
}

struct Workspace {
    data: TempDir,
    bucket: TempDir,
    temp: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            data: TempDir::new().unwrap(),
            bucket: TempDir::new().unwrap(),
            temp: TempDir::new().unwrap(),
        }
    }

    fn config(&self, batch_size: i64, compression: bool) -> ExporterConfig {
        let mut config = parse_config(&format!(
            "[storage]\ntarget = \"local\"\nlocal_root = \"{}\"\n",
            self.bucket.path().display()
        ))
        .unwrap();
        config.export.data_dir = self.data.path().to_path_buf();
        config.export.temp_dir = self.temp.path().to_path_buf();
        config.export.batch_size = batch_size;
        config.export.compression = compression;
        config
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.data.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn read_bucket(&self, key: &str) -> String {
        std::fs::read_to_string(self.bucket.path().join(key)).unwrap()
    }

    fn temp_is_empty(&self) -> bool {
        std::fs::read_dir(self.temp.path()).unwrap().next().is_none()
    }
}

fn sfm_with_rows(name: &str, rows: usize) -> String {
    let mut content = format!("# {name}.sfm\njsonS3Exported: false\n#id,name\n");
    for i in 0..rows {
        content.push_str(&format!("{i},row-{i}\n"));
    }
    content
}

async fn state_of(ws: &Workspace, path: &Path) -> ExportState {
    ExportStateTracker::new(ws.config(10, false).sfm)
        .load_state(&SourceFile::new(path).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_end_to_end_local_store() {
    let ws = Workspace::new();
    let path = ws.write("run-042.sfm", "# run-042.sfm\n#id,name\n1,alice\n2,bob\n");

    let (_tx, rx) = watch::channel(false);
    let store: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(ws.bucket.path()));
    let coordinator = ExportCoordinator::new(ws.config(10, false), store, rx);

    let summary = coordinator.execute_export().await.unwrap();

    assert_eq!(summary.files_discovered, 1);
    assert_eq!(summary.files_exported, 1);
    assert_eq!(summary.records_written, 2);
    assert_eq!(summary.batches_uploaded, 1);
    assert!(summary.is_successful());
    assert_eq!(
        ws.read_bucket("run-042/batch-0.json"),
        "{\"id\":\"1\",\"name\":\"alice\"}\n{\"id\":\"2\",\"name\":\"bob\"}\n"
    );
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "# run-042.sfm\njsonS3Exported:true\n#id,name\n1,alice\n2,bob\n"
    );
    assert!(ws.temp_is_empty());
}

#[tokio::test]
async fn test_second_run_skips_exported_files() {
    let ws = Workspace::new();
    ws.write("run.sfm", &sfm_with_rows("run", 3));

    let store = Arc::new(RecordingStore::default());
    let (_tx, rx) = watch::channel(false);
    let coordinator = ExportCoordinator::new(ws.config(10, false), store.clone(), rx);

    let first = coordinator.execute_export().await.unwrap();
    assert_eq!(first.files_exported, 1);

    let second = coordinator.execute_export().await.unwrap();
    assert_eq!(second.files_exported, 0);
    assert_eq!(second.files_already_exported, 1);
    assert_eq!(store.keys(), ["run/batch-0.json"]);
}

#[tokio::test]
async fn test_batches_of_500() {
    let ws = Workspace::new();
    ws.write("big.sfm", &sfm_with_rows("big", 1200));

    let store = Arc::new(RecordingStore::default());
    let (_tx, rx) = watch::channel(false);
    let coordinator = ExportCoordinator::new(ws.config(500, false), store.clone(), rx);

    let summary = coordinator.execute_export().await.unwrap();

    assert_eq!(summary.records_written, 1200);
    assert_eq!(
        store.keys(),
        ["big/batch-0.json", "big/batch-1.json", "big/batch-2.json"]
    );
    let sizes: Vec<usize> = store
        .keys()
        .iter()
        .map(|k| String::from_utf8(store.body(k)).unwrap().lines().count())
        .collect();
    assert_eq!(sizes, [500, 500, 200]);

    let first_line = String::from_utf8(store.body("big/batch-1.json")).unwrap();
    assert!(first_line.starts_with("{\"id\":\"500\",\"name\":\"row-500\"}\n"));
}

#[tokio::test]
async fn test_non_positive_batch_size_gives_one_batch() {
    for batch_size in [0, -1] {
        let ws = Workspace::new();
        ws.write("all.sfm", &sfm_with_rows("all", 1500));

        let store = Arc::new(RecordingStore::default());
        let (_tx, rx) = watch::channel(false);
        let coordinator = ExportCoordinator::new(ws.config(batch_size, false), store.clone(), rx);

        let summary = coordinator.execute_export().await.unwrap();

        assert_eq!(store.keys(), ["all/batch-0.json"]);
        assert_eq!(summary.records_written, 1500);
    }
}

#[tokio::test]
async fn test_mismatched_rows_are_counted_not_exported() {
    let ws = Workspace::new();
    ws.write(
        "ragged.sfm",
        "# ragged.sfm\n#id,name\n1,alice\n2\n3,carol,extra\n# note\n\n4, dave \n",
    );

    let store = Arc::new(RecordingStore::default());
    let (_tx, rx) = watch::channel(false);
    let coordinator = ExportCoordinator::new(ws.config(10, false), store.clone(), rx);

    let summary = coordinator.execute_export().await.unwrap();

    assert_eq!(summary.records_written, 2);
    assert_eq!(summary.records_skipped, 2);
    assert_eq!(
        String::from_utf8(store.body("ragged/batch-0.json")).unwrap(),
        "{\"id\":\"1\",\"name\":\"alice\"}\n{\"id\":\"4\",\"name\":\"dave\"}\n"
    );
}

#[tokio::test]
async fn test_gzip_compression_uploads_gz_key() {
    let ws = Workspace::new();
    ws.write("zip.sfm", &sfm_with_rows("zip", 400));

    let store = Arc::new(RecordingStore::default());
    let (_tx, rx) = watch::channel(false);
    let coordinator = ExportCoordinator::new(ws.config(1000, true), store.clone(), rx);

    let summary = coordinator.execute_export().await.unwrap();

    assert!(summary.is_successful());
    assert_eq!(store.keys(), ["zip/batch-0.json.gz"]);
    let receipt = &summary.files[0].report.batches[0];
    assert!(receipt.compressed);
    assert_eq!(&store.body("zip/batch-0.json.gz")[..2], &[0x1f, 0x8b]);
    assert_eq!(
        store.uploads.lock().unwrap()[0].1,
        "application/gzip"
    );
}

#[tokio::test]
async fn test_compression_not_smaller_uploads_original() {
    let ws = Workspace::new();
    ws.write("tiny.sfm", "# tiny.sfm\n#id,name\n1,a\n");

    let store = Arc::new(RecordingStore::default());
    let (_tx, rx) = watch::channel(false);
    let coordinator = ExportCoordinator::new(ws.config(10, true), store.clone(), rx)
        .with_compressor(Some(Arc::new(InflatingCompressor)));

    let summary = coordinator.execute_export().await.unwrap();

    assert_eq!(store.keys(), ["tiny/batch-0.json"]);
    assert_eq!(store.body("tiny/batch-0.json"), b"{\"id\":\"1\",\"name\":\"a\"}\n");
    assert!(!summary.files[0].report.batches[0].compressed);
}

#[tokio::test]
async fn test_compression_failure_fails_file_and_keeps_state() {
    let ws = Workspace::new();
    let path = ws.write("run.sfm", &sfm_with_rows("run", 5));

    let store = Arc::new(RecordingStore::default());
    let (_tx, rx) = watch::channel(false);
    let coordinator = ExportCoordinator::new(ws.config(10, true), store.clone(), rx)
        .with_compressor(Some(Arc::new(BrokenCompressor)));

    let summary = coordinator.execute_export().await.unwrap();

    assert_eq!(summary.files_failed, 1);
    assert!(store.keys().is_empty());
    assert_eq!(state_of(&ws, &path).await, ExportState::NotExported);
}

#[tokio::test]
async fn test_upload_failure_isolated_to_one_file() {
    let ws = Workspace::new();
    let bad = ws.write("a-bad.sfm", &sfm_with_rows("a-bad", 25));
    let good = ws.write("b-good.sfm", &sfm_with_rows("b-good", 5));

    let store = Arc::new(RecordingStore::failing_on("a-bad/batch-1"));
    let (_tx, rx) = watch::channel(false);
    let coordinator = ExportCoordinator::new(ws.config(10, false), store.clone(), rx);

    let summary = coordinator.execute_export().await.unwrap();

    assert_eq!(summary.files_failed, 1);
    assert_eq!(summary.files_exported, 1);
    assert!(!summary.is_successful());
    // batch-2 of the failing file is never attempted
    assert_eq!(store.keys(), ["a-bad/batch-0.json", "b-good/batch-0.json"]);
    assert_eq!(summary.files[0].status, FileStatus::Failed);
    assert_eq!(state_of(&ws, &bad).await, ExportState::NotExported);
    assert_eq!(state_of(&ws, &good).await, ExportState::Exported);
}

#[tokio::test]
async fn test_marking_twice_is_byte_identical() {
    let ws = Workspace::new();
    let path = ws.write("run.sfm", "# run.sfm\n#id,name\n1,alice\n");
    let tracker = ExportStateTracker::new(ws.config(10, false).sfm);
    let file = SourceFile::new(&path).unwrap();

    tracker.mark_exported(&file).await.unwrap();
    let once = std::fs::read(&path).unwrap();
    tracker.mark_exported(&file).await.unwrap();
    let twice = std::fs::read(&path).unwrap();

    assert_eq!(once, twice);
    assert!(tracker.is_exported(&file).await.unwrap());
}

#[tokio::test]
async fn test_missing_header_fails_only_that_file() {
    let ws = Workspace::new();
    ws.write("a.sfm", "# a.sfm\nno header\n1,2\n");
    ws.write("b.sfm", &sfm_with_rows("b", 2));

    let store = Arc::new(RecordingStore::default());
    let (_tx, rx) = watch::channel(false);
    let coordinator = ExportCoordinator::new(ws.config(10, false), store.clone(), rx);

    let summary = coordinator.execute_export().await.unwrap();

    assert_eq!(summary.files_failed, 1);
    assert_eq!(summary.files_exported, 1);
    assert_eq!(store.keys(), ["b/batch-0.json"]);
    assert!(summary.errors[0].message.contains("a.sfm"));
}

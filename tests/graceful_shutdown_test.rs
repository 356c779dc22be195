//! Integration tests for graceful shutdown
//!
//! The coordinator checks the shutdown flag before each file: the file in
//! progress always completes, and files not yet started keep their state.

use sfm_exporter::adapters::storage::{BlobStore, LocalBlobStore};
use sfm_exporter::config::parse_config;
use sfm_exporter::core::export::{ExportCoordinator, ExportSummary};
use sfm_exporter::core::state::{ExportState, ExportStateTracker};
use sfm_exporter::domain::SourceFile;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;

fn setup(files: &[&str]) -> (TempDir, TempDir, TempDir, sfm_exporter::config::ExporterConfig) {
    let data = TempDir::new().unwrap();
    let bucket = TempDir::new().unwrap();
    let temp = TempDir::new().unwrap();
    for name in files {
        std::fs::write(
            data.path().join(format!("{name}.sfm")),
            format!("# {name}.sfm\n#id,name\n1,a\n2,b\n"),
        )
        .unwrap();
    }

    let mut config = parse_config(&format!(
        "[storage]\ntarget = \"local\"\nlocal_root = \"{}\"\n",
        bucket.path().display()
    ))
    .unwrap();
    config.export.data_dir = data.path().to_path_buf();
    config.export.temp_dir = temp.path().to_path_buf();
    (data, bucket, temp, config)
}

#[tokio::test]
async fn test_shutdown_signal_propagation() {
    let (shutdown_tx, shutdown_rx1) = watch::channel(false);
    let shutdown_rx2 = shutdown_rx1.clone();

    assert!(!*shutdown_rx1.borrow());
    assert!(!*shutdown_rx2.borrow());

    shutdown_tx.send(true).unwrap();

    assert!(*shutdown_rx1.borrow());
    assert!(*shutdown_rx2.borrow());
}

#[tokio::test]
async fn test_shutdown_before_start_processes_nothing() {
    let (data, bucket, _temp, config) = setup(&["a", "b", "c"]);
    let sfm = config.sfm.clone();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let store: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(bucket.path()));
    let coordinator = ExportCoordinator::new(config, store, shutdown_rx);
    shutdown_tx.send(true).unwrap();

    let summary = coordinator.execute_export().await.unwrap();

    assert!(summary.interrupted);
    assert_eq!(summary.files_discovered, 3);
    assert!(summary.files.is_empty());

    let tracker = ExportStateTracker::new(sfm);
    for name in ["a", "b", "c"] {
        let file = SourceFile::new(data.path().join(format!("{name}.sfm"))).unwrap();
        assert_eq!(tracker.load_state(&file).await.unwrap(), ExportState::Absent);
    }
}

#[tokio::test]
async fn test_rerun_after_interruption_exports_remaining_files() {
    let (_data, bucket, _temp, config) = setup(&["a", "b"]);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let store: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(bucket.path()));
    let interrupted = ExportCoordinator::new(config.clone(), Arc::clone(&store), shutdown_rx);
    shutdown_tx.send(true).unwrap();
    assert!(interrupted.execute_export().await.unwrap().interrupted);

    let (_tx, rx) = watch::channel(false);
    let resumed = ExportCoordinator::new(config, store, rx);
    let summary = resumed.execute_export().await.unwrap();

    assert!(!summary.interrupted);
    assert_eq!(summary.files_exported, 2);
    assert!(bucket.path().join("a/batch-0.json").exists());
    assert!(bucket.path().join("b/batch-0.json").exists());
}

#[tokio::test]
async fn test_shutdown_signal_timing() {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let waiter = tokio::spawn(async move {
        shutdown_rx.changed().await.unwrap();
        *shutdown_rx.borrow()
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    shutdown_tx.send(true).unwrap();

    let observed = tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .unwrap()
        .unwrap();
    assert!(observed);
}

#[test]
fn test_export_summary_interrupted_flag() {
    let mut summary = ExportSummary::new();
    assert!(!summary.interrupted);

    summary.interrupted = true;
    assert!(summary.interrupted);
    assert!(summary.is_successful());
}

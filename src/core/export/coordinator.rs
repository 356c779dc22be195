//! Export coordinator - main orchestrator for the export process
//!
//! Visits discovered SFM files one at a time. For each file it checks the
//! export sentinel, streams the file through header resolution, record
//! transformation and batch rotation, and marks the file as exported once
//! every batch was acknowledged. A failing file is recorded and the run
//! continues with the next one.

use crate::adapters::compression::{Compressor, GzipCompressor};
use crate::adapters::storage::{create_blob_store, BlobStore};
use crate::config::ExporterConfig;
use crate::core::export::batch::{BatchConfig, BatchRotator};
use crate::core::export::summary::{
    ExportError, ExportSummary, FileOutcome, FileReport, FileStatus,
};
use crate::core::state::{ExportStateTracker, MarkOutcome};
use crate::core::transform::{resolve_header, LineOutcome, LineReader, RecordTransformer};
use crate::domain::{ExporterError, Result, SourceFile};
use std::collections::HashMap;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncSeekExt, BufReader};
use tokio::sync::watch;
use walkdir::WalkDir;

/// Find SFM files under a directory, sorted by file name
///
/// # Errors
///
/// Returns an I/O error if the directory does not exist or cannot be walked.
pub fn discover_files(data_dir: &Path, extension: &str) -> Result<Vec<SourceFile>> {
    if !data_dir.is_dir() {
        return Err(ExporterError::Io(format!(
            "Data directory not found: {}",
            data_dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(data_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            ExporterError::Io(format!("Failed to scan {}: {}", data_dir.display(), e))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.to_string_lossy() == extension);
        if !matches {
            continue;
        }
        match SourceFile::new(entry.path()) {
            Ok(file) => files.push(file),
            Err(e) => tracing::warn!(path = %entry.path().display(), error = %e, "Skipping file"),
        }
    }

    Ok(files)
}

/// Export coordinator
pub struct ExportCoordinator {
    config: ExporterConfig,
    store: Arc<dyn BlobStore>,
    compressor: Option<Arc<dyn Compressor>>,
    tracker: ExportStateTracker,
    shutdown_signal: watch::Receiver<bool>,
}

impl ExportCoordinator {
    /// Create a coordinator with the blob store selected by the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the blob store cannot be created.
    pub async fn from_config(
        config: ExporterConfig,
        shutdown_signal: watch::Receiver<bool>,
    ) -> Result<Self> {
        let store = create_blob_store(&config).await?;
        Ok(Self::new(config, store, shutdown_signal))
    }

    /// Create a coordinator around an existing blob store
    ///
    /// Gzip compression is used when `export.compression` is enabled.
    pub fn new(
        config: ExporterConfig,
        store: Arc<dyn BlobStore>,
        shutdown_signal: watch::Receiver<bool>,
    ) -> Self {
        let compressor: Option<Arc<dyn Compressor>> = if config.export.compression {
            Some(Arc::new(GzipCompressor::new()))
        } else {
            None
        };
        let tracker = ExportStateTracker::new(config.sfm.clone());

        Self {
            config,
            store,
            compressor,
            tracker,
            shutdown_signal,
        }
    }

    /// Replace the compressor (`None` disables compression)
    pub fn with_compressor(mut self, compressor: Option<Arc<dyn Compressor>>) -> Self {
        self.compressor = compressor;
        self
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    /// Execute the export
    ///
    /// # Errors
    ///
    /// Returns an error only when the data directory cannot be scanned.
    /// Per-file failures are reported in the summary.
    pub async fn execute_export(&self) -> Result<ExportSummary> {
        let start_time = Instant::now();
        let mut summary = ExportSummary::new();
        summary.dry_run = self.config.export.dry_run;

        tracing::info!(
            data_dir = %self.config.export.data_dir.display(),
            store = %self.store.describe(),
            batch_size = self.config.export.batch_size,
            compression = self.compressor.is_some(),
            "Starting export process"
        );

        let files = discover_files(
            &self.config.export.data_dir,
            &self.config.export.file_extension,
        )?;
        summary.files_discovered = files.len();
        tracing::info!(count = files.len(), "Discovered SFM files");

        let mut claimed: HashMap<String, PathBuf> = HashMap::new();

        for file in &files {
            if *self.shutdown_signal.borrow() {
                tracing::warn!(
                    remaining = files.len() - summary.files.len(),
                    "Shutdown requested, stopping before next file"
                );
                summary.interrupted = true;
                break;
            }

            // Keys derive from the base name, so a second file with the same
            // stem would overwrite the first one's batches.
            if let Some(first) = claimed.get(file.base_name()) {
                let error = ExporterError::Configuration(format!(
                    "Base name '{}' of {} is already used by {}",
                    file.base_name(),
                    file.path().display(),
                    first.display()
                ));
                let mut outcome = FileOutcome {
                    path: file.path().to_path_buf(),
                    status: FileStatus::Failed,
                    report: FileReport::default(),
                    error: None,
                };
                self.fail(file, &error, &mut outcome, &mut summary);
                summary.record_file(outcome);
                continue;
            }
            claimed.insert(file.base_name().to_string(), file.path().to_path_buf());

            let outcome = self.process_file(file, &mut summary).await;
            summary.record_file(outcome);
        }

        let summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();
        Ok(summary)
    }

    async fn process_file(&self, file: &SourceFile, summary: &mut ExportSummary) -> FileOutcome {
        let mut outcome = FileOutcome {
            path: file.path().to_path_buf(),
            status: FileStatus::Failed,
            report: FileReport::default(),
            error: None,
        };

        let state = match self.tracker.load_state(file).await {
            Ok(state) => state,
            Err(e) => {
                self.fail(file, &e, &mut outcome, summary);
                return outcome;
            }
        };

        if state.is_exported() {
            tracing::info!(file = %file, "Already exported, skipping");
            outcome.status = FileStatus::AlreadyExported;
            return outcome;
        }

        tracing::info!(file = %file, state = %state, "Exporting file");
        match self.export_file(file).await {
            Ok(report) => {
                outcome.report = report;
                outcome.status = FileStatus::Exported;
            }
            Err(e) => {
                self.fail(file, &e, &mut outcome, summary);
                return outcome;
            }
        }

        if self.config.export.dry_run {
            tracing::info!(file = %file, "Dry run: export state not recorded");
            return outcome;
        }

        match self.tracker.mark_exported(file).await {
            Ok(MarkOutcome::NoAnchor) => {
                outcome.error = Some("export state not recorded: no anchor line".to_string());
            }
            Ok(mark) => {
                tracing::info!(
                    file = %file,
                    records = outcome.report.records_written,
                    batches = outcome.report.batches.len(),
                    mark = ?mark,
                    "File exported"
                );
            }
            Err(e) => {
                tracing::warn!(
                    file = %file,
                    error = %e,
                    "Uploaded but failed to record export state, file will be exported again"
                );
                outcome.error = Some(e.to_string());
                summary.add_error(
                    ExportError::from_error(&e).with_context(format!("file={}", file.path().display())),
                );
            }
        }

        outcome
    }

    fn fail(
        &self,
        file: &SourceFile,
        error: &ExporterError,
        outcome: &mut FileOutcome,
        summary: &mut ExportSummary,
    ) {
        tracing::error!(file = %file, error = %error, "Failed to export file");
        outcome.status = FileStatus::Failed;
        outcome.error = Some(error.to_string());
        summary.add_error(
            ExportError::from_error(error).with_context(format!("file={}", file.path().display())),
        );
    }

    /// Run the pipeline over one file without touching its export state
    ///
    /// # Errors
    ///
    /// Returns the first I/O, schema, compression or upload error. Batches
    /// uploaded before the error stay uploaded; a rerun overwrites them.
    pub async fn export_file(&self, file: &SourceFile) -> Result<FileReport> {
        let path = file.path();
        let handle = tokio::fs::File::open(path)
            .await
            .map_err(|e| ExporterError::Io(format!("Failed to open {}: {}", path.display(), e)))?;
        let mut reader = BufReader::new(handle);

        let schema = resolve_header(&mut reader, &self.config.sfm, file).await?;
        reader
            .seek(SeekFrom::Start(0))
            .await
            .map_err(|e| ExporterError::Io(format!("Failed to rewind {}: {}", path.display(), e)))?;

        let transformer = RecordTransformer::new(schema, self.config.sfm.clone());
        let mut rotator = BatchRotator::open(
            file.clone(),
            BatchConfig::from_export_config(&self.config.export),
            Arc::clone(&self.store),
            self.compressor.clone(),
        )
        .await?;

        let mut report = FileReport::default();
        let mut lines = LineReader::new(reader);
        let mut line_number = 0usize;

        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| ExporterError::Io(format!("Failed to read {}: {}", path.display(), e)))?
        {
            line_number += 1;
            match transformer.transform_line(&line) {
                LineOutcome::Record(record) => {
                    rotator.write_record(&record).await?;
                    report.records_written += 1;
                }
                LineOutcome::Skipped => report.lines_ignored += 1,
                LineOutcome::Mismatch { found } => {
                    report.records_skipped += 1;
                    tracing::debug!(
                        file = %file,
                        line = line_number,
                        found,
                        expected = transformer.schema().arity(),
                        "Skipping line with wrong field count"
                    );
                }
            }
        }

        report.batches = rotator.finish().await?;

        if report.records_skipped > 0 {
            tracing::warn!(
                file = %file,
                skipped = report.records_skipped,
                "Lines skipped for field count mismatch"
            );
        }

        Ok(report)
    }
}

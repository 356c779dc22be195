//! Export summary and reporting
//!
//! This module defines structures for tracking and reporting export results.

use crate::core::export::batch::BatchReceipt;
use crate::domain::ExporterError;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Result of running the pipeline over one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileReport {
    /// Records written to artifacts
    pub records_written: usize,

    /// Data lines dropped because their field count differed from the header
    pub records_skipped: usize,

    /// Blank, comment, header and sentinel lines
    pub lines_ignored: usize,

    /// One receipt per uploaded batch, in batch order
    pub batches: Vec<BatchReceipt>,
}

/// Final status of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Every batch uploaded
    Exported,
    /// Sentinel was already `true`; nothing was done
    AlreadyExported,
    /// The pipeline failed; the file stays unexported
    Failed,
}

/// Per-file entry of the summary
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub status: FileStatus,
    pub report: FileReport,
    pub error: Option<String>,
}

/// Summary of an export run
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    /// Files found under the data directory
    pub files_discovered: usize,

    /// Files whose batches all uploaded during this run
    pub files_exported: usize,

    /// Files skipped because they were exported before
    pub files_already_exported: usize,

    /// Files whose pipeline failed
    pub files_failed: usize,

    /// Records written across all files
    pub records_written: usize,

    /// Records dropped for a field count mismatch
    pub records_skipped: usize,

    /// Batches acknowledged by the blob store
    pub batches_uploaded: usize,

    /// Duration of the run
    pub duration: Duration,

    /// Whether the run stopped early on a shutdown signal
    pub interrupted: bool,

    /// Whether uploads and state updates were skipped
    pub dry_run: bool,

    /// One entry per processed file, in discovery order
    pub files: Vec<FileOutcome>,

    /// Errors encountered during the run
    pub errors: Vec<ExportError>,
}

impl ExportSummary {
    /// Create a new empty export summary
    pub fn new() -> Self {
        Self {
            files_discovered: 0,
            files_exported: 0,
            files_already_exported: 0,
            files_failed: 0,
            records_written: 0,
            records_skipped: 0,
            batches_uploaded: 0,
            duration: Duration::from_secs(0),
            interrupted: false,
            dry_run: false,
            files: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Add an error
    pub fn add_error(&mut self, error: ExportError) {
        self.errors.push(error);
    }

    /// Record the outcome of one file and update the totals
    pub fn record_file(&mut self, outcome: FileOutcome) {
        match outcome.status {
            FileStatus::Exported => self.files_exported += 1,
            FileStatus::AlreadyExported => self.files_already_exported += 1,
            FileStatus::Failed => self.files_failed += 1,
        }
        self.records_written += outcome.report.records_written;
        self.records_skipped += outcome.report.records_skipped;
        self.batches_uploaded += outcome.report.batches.len();
        self.files.push(outcome);
    }

    /// Check if the export was successful (no failed files)
    ///
    /// State update errors do not count: the affected file is re-exported on
    /// the next run under the same keys.
    pub fn is_successful(&self) -> bool {
        self.files_failed == 0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            files_discovered = self.files_discovered,
            files_exported = self.files_exported,
            files_already_exported = self.files_already_exported,
            files_failed = self.files_failed,
            records_written = self.records_written,
            records_skipped = self.records_skipped,
            batches_uploaded = self.batches_uploaded,
            duration_secs = self.duration.as_secs_f64(),
            interrupted = self.interrupted,
            dry_run = self.dry_run,
            "Export completed"
        );

        if !self.errors.is_empty() {
            tracing::warn!(
                error_count = self.errors.len(),
                "Export completed with errors"
            );
            for error in &self.errors {
                tracing::warn!(
                    error_type = ?error.error_type,
                    message = %error.message,
                    context = ?error.context,
                    "Export error"
                );
            }
        }
    }
}

impl Default for ExportSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// Type of export error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExportErrorType {
    /// Reading or writing local files
    Io,
    /// No header line in a file
    Schema,
    /// Compressing an artifact
    Compression,
    /// Uploading an artifact
    Upload,
    /// Recording the export sentinel
    State,
    /// Object storage outside the upload path
    Storage,
    /// Configuration error
    Configuration,
    /// Unknown error
    Unknown,
}

impl From<&ExporterError> for ExportErrorType {
    fn from(error: &ExporterError) -> Self {
        match error {
            ExporterError::Io(_) => ExportErrorType::Io,
            ExporterError::SchemaNotFound(_) => ExportErrorType::Schema,
            ExporterError::Compression(_) => ExportErrorType::Compression,
            ExporterError::Upload(_) => ExportErrorType::Upload,
            ExporterError::StateUpdate(_) => ExportErrorType::State,
            ExporterError::Storage(_) => ExportErrorType::Storage,
            ExporterError::Configuration(_) => ExportErrorType::Configuration,
            ExporterError::Serialization(_) | ExporterError::Other(_) => ExportErrorType::Unknown,
        }
    }
}

/// Export error with context
#[derive(Debug, Clone, Serialize)]
pub struct ExportError {
    /// Type of error
    pub error_type: ExportErrorType,

    /// Error message
    pub message: String,

    /// Optional context (e.g., the file path)
    pub context: Option<String>,
}

impl ExportError {
    /// Create a new export error
    pub fn new(error_type: ExportErrorType, message: String) -> Self {
        Self {
            error_type,
            message,
            context: None,
        }
    }

    /// Build from a library error, keeping its classification
    pub fn from_error(error: &ExporterError) -> Self {
        Self::new(ExportErrorType::from(error), error.to_string())
    }

    /// Add context to the error
    pub fn with_context(mut self, context: String) -> Self {
        self.context = Some(context);
        self
    }
}

//! Export orchestration and batch processing
//!
//! - [`batch`] - Batch accumulation, rotation, compression and upload
//! - [`coordinator`] - File discovery and the per-file pipeline
//! - [`summary`] - Per-file reports and the run summary

pub mod batch;
pub mod coordinator;
pub mod summary;

pub use batch::{BatchConfig, BatchReceipt, BatchRotator, RotatorState};
pub use coordinator::{discover_files, ExportCoordinator};
pub use summary::{ExportError, ExportErrorType, ExportSummary, FileOutcome, FileReport, FileStatus};

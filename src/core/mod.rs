//! Core business logic for the exporter.
//!
//! # Modules
//!
//! - [`export`] - Orchestration, batch rotation and reporting
//! - [`state`] - The per-file export sentinel
//! - [`transform`] - Header resolution and record transformation
//!
//! # Export Workflow
//!
//! For every SFM file under the data directory, in file name order:
//!
//! 1. **Check State**: Skip the file if its sentinel is already `true`
//! 2. **Resolve Header**: Find the column header line
//! 3. **Transform**: Turn each data line into a JSON object keyed by column
//! 4. **Batch**: Write records into JSON Lines artifacts, rotating at `batch_size`
//! 5. **Upload**: Compress each finalized artifact if smaller and upload it
//! 6. **Mark**: Flip or insert the sentinel once every batch was acknowledged
//! 7. **Report**: Summarize files, records and batches
//!
//! # Example
//!
//! ```rust,no_run
//! use sfm_exporter::config::load_config;
//! use sfm_exporter::core::export::ExportCoordinator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("sfm-exporter.toml")?;
//!
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! let coordinator = ExportCoordinator::from_config(config, shutdown_rx).await?;
//!
//! let summary = coordinator.execute_export().await?;
//!
//! println!("Exported: {}", summary.files_exported);
//! println!("Failed: {}", summary.files_failed);
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod state;
pub mod transform;

//! Export command implementation
//!
//! This module implements the `export` command: every unexported SFM file
//! under the data directory is converted to JSON Lines batches and uploaded.

use crate::config::load_config;
use crate::core::export::{ExportCoordinator, ExportSummary, FileStatus};
use clap::Args;
use std::path::PathBuf;
use tokio::sync::watch;

/// Arguments for the export command
#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Override the data directory to scan
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Override the batch size (0 or negative puts each file in one batch)
    #[arg(long, value_name = "N", allow_hyphen_values = true)]
    pub batch_size: Option<i64>,

    /// Upload uncompressed artifacts
    #[arg(long)]
    pub no_compression: bool,

    /// Dry run mode - convert and batch without uploading or marking files
    #[arg(long)]
    pub dry_run: bool,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        // Apply CLI overrides
        if let Some(data_dir) = &self.data_dir {
            tracing::info!(data_dir = %data_dir.display(), "Overriding data directory from CLI");
            config.export.data_dir = data_dir.clone();
        }

        if let Some(batch_size) = self.batch_size {
            tracing::info!(batch_size, "Overriding batch size from CLI");
            config.export.batch_size = batch_size;
        }

        if self.no_compression {
            tracing::info!("Disabling compression from CLI");
            config.export.compression = false;
        }

        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.export.dry_run = true;
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        if config.export.dry_run {
            tracing::info!("Dry run mode enabled - nothing will be uploaded");
            println!("🔍 DRY RUN MODE - No batches will be uploaded and no files marked");
            println!();
        }

        tracing::info!("Creating export coordinator");
        let coordinator = match ExportCoordinator::from_config(config, shutdown_signal).await {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create export coordinator");
                eprintln!("Failed to initialize export: {e}");
                return Ok(4);
            }
        };

        if let Err(e) = coordinator.store().test_connection().await {
            tracing::error!(error = %e, store = %coordinator.store().describe(), "Storage connection check failed");
            eprintln!("Failed to connect to {}: {e}", coordinator.store().describe());
            return Ok(4);
        }

        println!("🚀 Starting export to {}...", coordinator.store().describe());
        println!();

        let summary = match coordinator.execute_export().await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                eprintln!("Export failed: {e}");
                return Ok(5);
            }
        };

        print_summary(&summary);

        let exit_code = if summary.interrupted {
            println!("⚠️  Export interrupted. Files not yet marked are exported on the next run.");
            println!();
            tracing::info!("Export interrupted by user signal");
            130
        } else if summary.is_successful() {
            println!("✅ Export completed successfully!");
            0
        } else {
            println!("⚠️  Export completed with failures");
            1
        };

        Ok(exit_code)
    }
}

fn print_summary(summary: &ExportSummary) {
    println!();
    println!("📊 Export Summary:");
    println!("  Files Discovered: {}", summary.files_discovered);
    println!("  Files Exported: {}", summary.files_exported);
    println!("  Already Exported: {}", summary.files_already_exported);
    println!("  Failed: {}", summary.files_failed);
    println!("  Records Written: {}", summary.records_written);
    println!("  Records Skipped: {}", summary.records_skipped);
    println!("  Batches Uploaded: {}", summary.batches_uploaded);
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!();

    let failed: Vec<_> = summary
        .files
        .iter()
        .filter(|f| f.status == FileStatus::Failed)
        .collect();
    if !failed.is_empty() {
        println!("❌ Failed files:");
        for file in failed {
            println!(
                "  - {}: {}",
                file.path.display(),
                file.error.as_deref().unwrap_or("unknown error")
            );
        }
        println!();
    }

    if !summary.errors.is_empty() {
        println!("⚠️  Errors encountered:");
        for error in &summary.errors {
            println!("  - {:?}: {}", error.error_type, error.message);
            if let Some(context) = &error.context {
                println!("    Context: {context}");
            }
        }
        println!();
    }
}

//! Status command implementation
//!
//! Lists the SFM files under the data directory together with the state of
//! their export sentinel, and optionally the keys already uploaded for each.

use crate::adapters::storage::create_blob_store;
use crate::config::load_config;
use crate::core::export::discover_files;
use crate::core::state::{ExportState, ExportStateTracker};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the status command
#[derive(Args, Debug, Default)]
pub struct StatusArgs {
    /// Override the data directory to scan
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Also list uploaded keys under each file's prefix
    #[arg(long)]
    pub remote: bool,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking export status");

        println!("📊 Export Status");
        println!();

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        if let Some(data_dir) = &self.data_dir {
            config.export.data_dir = data_dir.clone();
        }

        let files = match discover_files(&config.export.data_dir, &config.export.file_extension) {
            Ok(f) => f,
            Err(e) => {
                println!("❌ Failed to scan {}", config.export.data_dir.display());
                println!("   Error: {e}");
                return Ok(5);
            }
        };

        if files.is_empty() {
            println!(
                "No .{} files found under {}.",
                config.export.file_extension,
                config.export.data_dir.display()
            );
            return Ok(0);
        }

        let store = if self.remote {
            match create_blob_store(&config).await {
                Ok(s) => Some(s),
                Err(e) => {
                    println!("❌ Failed to connect to object storage");
                    println!("   Error: {e}");
                    return Ok(4);
                }
            }
        } else {
            None
        };

        let tracker = ExportStateTracker::new(config.sfm.clone());

        println!("Found {} file(s):", files.len());
        println!();
        println!("{:<60} {:<15}", "File", "State");
        println!("{}", "-".repeat(76));

        let mut exported = 0usize;
        for file in &files {
            let state = match tracker.load_state(file).await {
                Ok(s) => s,
                Err(e) => {
                    println!("{:<60} ❌ {}", file.path().display(), e);
                    continue;
                }
            };

            let label = match state {
                ExportState::Exported => {
                    exported += 1;
                    "✅ Exported"
                }
                ExportState::NotExported => "⏸️  Pending",
                ExportState::Absent => "🆕 New",
            };
            println!("{:<60} {:<15}", file.path().display(), label);

            if let Some(store) = &store {
                match store.list(&file.key_prefix()).await {
                    Ok(objects) if objects.is_empty() => println!("    (no uploaded batches)"),
                    Ok(objects) => {
                        for object in objects {
                            println!("    {} ({} bytes)", object.key, object.size);
                        }
                    }
                    Err(e) => println!("    ❌ Failed to list uploads: {e}"),
                }
            }
        }

        println!();
        println!("{exported} of {} file(s) exported", files.len());
        println!();
        Ok(0)
    }
}

//! Purge command implementation
//!
//! Deletes every uploaded batch of one source file so it can be exported
//! again from scratch. The sentinel in the source file is left alone.

use crate::adapters::storage::create_blob_store;
use crate::config::load_config;
use clap::Args;

/// Arguments for the purge command
#[derive(Args, Debug)]
pub struct PurgeArgs {
    /// File name without extension, i.e. the key prefix of its batches
    pub file_stem: String,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl PurgeArgs {
    /// Execute the purge command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let stem = self.file_stem.trim_matches('/');
        if stem.is_empty() {
            println!("❌ A file stem is required");
            return Ok(2);
        }
        let prefix = format!("{stem}/");
        tracing::info!(prefix = %prefix, "Purging uploaded batches");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let store = match create_blob_store(&config).await {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to connect to object storage");
                println!("   Error: {e}");
                return Ok(4);
            }
        };

        let objects = match store.list(&prefix).await {
            Ok(o) => o,
            Err(e) => {
                println!("❌ Failed to list {prefix} in {}", store.describe());
                println!("   Error: {e}");
                return Ok(if e.is_connection_error() { 4 } else { 5 });
            }
        };

        if objects.is_empty() {
            println!("Nothing to purge under {prefix}");
            return Ok(0);
        }

        println!("Objects under {prefix} in {}:", store.describe());
        for object in &objects {
            println!("  {} ({} bytes)", object.key, object.size);
        }
        println!();

        if !self.yes {
            print!("Delete {} object(s)? [y/N]: ", objects.len());
            use std::io::{self, Write};
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Purge cancelled.");
                return Ok(0);
            }
        }

        let mut failed = 0usize;
        for object in &objects {
            match store.delete(&object.key).await {
                Ok(()) => tracing::info!(key = %object.key, "Deleted object"),
                Err(e) => {
                    failed += 1;
                    tracing::error!(key = %object.key, error = %e, "Failed to delete object");
                    println!("  ❌ {}: {e}", object.key);
                }
            }
        }

        if failed == 0 {
            println!("✅ Deleted {} object(s)", objects.len());
            Ok(0)
        } else {
            println!("⚠️  {failed} of {} deletion(s) failed", objects.len());
            Ok(1)
        }
    }
}

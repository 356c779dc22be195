//! Fetch command implementation
//!
//! Downloads one uploaded batch, optionally gunzipping it.

use crate::adapters::compression::decompress_file;
use crate::adapters::storage::create_blob_store;
use crate::config::load_config;
use crate::domain::StorageError;
use clap::Args;
use std::path::{Path, PathBuf};

/// Arguments for the fetch command
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Object key, e.g. `run-042/batch-0.json.gz`
    pub key: String,

    /// Where to write the object (defaults to the key's file name)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Gunzip the downloaded object
    #[arg(long)]
    pub decompress: bool,
}

impl FetchArgs {
    /// Execute the fetch command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(key = %self.key, "Fetching uploaded batch");

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

        let output = self.output_path();
        let download = if self.decompress {
            download_path(&output)
        } else {
            output.clone()
        };

        let bytes = match store.get(&self.key, &download).await {
            Ok(n) => n,
            Err(StorageError::NotFound(key)) => {
                println!("❌ Object not found: {key}");
                return Ok(1);
            }
            Err(e) if e.is_connection_error() => {
                println!("❌ Failed to connect to {}", store.describe());
                println!("   Error: {e}");
                return Ok(4);
            }
            Err(e) => {
                println!("❌ Download failed");
                println!("   Error: {e}");
                return Ok(5);
            }
        };

        if self.decompress {
            let result = decompress_file(&download, &output).await;
            if let Err(e) = tokio::fs::remove_file(&download).await {
                tracing::warn!(path = %download.display(), error = %e, "Failed to remove download");
            }
            match result {
                Ok(n) => {
                    println!("✅ {} ({bytes} bytes) -> {} ({n} bytes)", self.key, output.display());
                }
                Err(e) => {
                    println!("❌ Failed to decompress {}", self.key);
                    println!("   Error: {e}");
                    return Ok(5);
                }
            }
        } else {
            println!("✅ {} -> {} ({bytes} bytes)", self.key, output.display());
        }

        Ok(0)
    }

    fn output_path(&self) -> PathBuf {
        if let Some(output) = &self.output {
            return output.clone();
        }
        let name = self.key.rsplit('/').next().unwrap_or(&self.key);
        let name = if self.decompress {
            name.strip_suffix(".gz").unwrap_or(name)
        } else {
            name
        };
        PathBuf::from(name)
    }
}

fn download_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".download");
    PathBuf::from(name)
}

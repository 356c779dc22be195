//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the exporter configuration file.

use crate::config::{load_config, StorageTarget};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates as well
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(2);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);

        match config.storage.target {
            StorageTarget::S3 => {
                println!("  Storage Target: S3");
                println!("  Bucket: {}", config.storage.bucket);
                println!("  Region: {}", config.storage.region);
                if let Some(endpoint) = &config.storage.endpoint {
                    println!("  Endpoint: {endpoint}");
                }
                println!(
                    "  Credentials: {}",
                    if config.storage.access_key.is_some() {
                        "static (***)"
                    } else {
                        "default AWS chain"
                    }
                );
                println!("  Path Style: {}", config.storage.path_style);
            }
            StorageTarget::Local => {
                println!("  Storage Target: local");
                if let Some(root) = &config.storage.local_root {
                    println!("  Root: {}", root.display());
                }
            }
        }
        if let Some(prefix) = &config.storage.prefix {
            println!("  Key Prefix: {prefix}");
        }

        println!("  Data Directory: {}", config.export.data_dir.display());
        println!("  File Extension: .{}", config.export.file_extension);
        match config.export.batch_limit() {
            Some(n) => println!("  Batch Size: {n}"),
            None => println!("  Batch Size: unbounded"),
        }
        println!("  Compression: {}", config.export.compression);
        println!("  Temp Directory: {}", config.export.temp_dir.display());
        println!("  Sentinel Key: {}", config.sfm.sentinel_key);
        println!("  Anchor Patterns: {:?}", config.sfm.anchor_patterns);
        println!();
        Ok(0)
    }
}

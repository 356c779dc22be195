//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "sfm-exporter.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing SFM exporter configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        match fs::write(&self.output, sample_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your bucket and data directory", self.output);
                println!("  2. Set SFMX_ACCESS_KEY and SFMX_SECRET_KEY in .env, or remove");
                println!("     access_key/secret_key to use the default AWS credential chain");
                println!("  3. Validate configuration: sfm-exporter validate-config");
                println!("  4. Run export: sfm-exporter export");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }
}

/// Commented sample configuration
pub fn sample_config() -> &'static str {
    r##"# SFM Exporter Configuration File
# Exports SFM files as batched JSON Lines to S3-compatible object storage

[application]
log_level = "info"  # trace | debug | info | warn | error

[storage]
target = "s3"  # s3 | local
bucket = "segment-metadata"
region = "us-east-1"
# endpoint = "http://localhost:9000"  # S3-compatible stores (MinIO, Ceph, ...)
# path_style = true
access_key = "${SFMX_ACCESS_KEY}"
secret_key = "${SFMX_SECRET_KEY}"
# prefix = "exports"
# local_root = "/var/lib/sfm-exporter/bucket"  # required when target = "local"

[export]
data_dir = "data"
file_extension = "sfm"
batch_size = 1000  # 0 or negative: one batch per file
compression = true
temp_dir = "/tmp/sfm-exporter"
flush_interval = 1000
keep_artifacts = false
shutdown_timeout_secs = 30
dry_run = false

[sfm]
comment_marker = "#"
separator = ","
sentinel_key = "jsonS3Exported"
anchor_patterns = [".sfm", "segmeta.json"]
missing_anchor = "error"  # error | ignore

[logging]
local_enabled = false
local_path = "logs"
local_rotation = "daily"  # daily | hourly | never
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn test_sample_config_parses_and_validates() {
        std::env::set_var("SFMX_ACCESS_KEY", "AKIAEXAMPLE");
        std::env::set_var("SFMX_SECRET_KEY", "example-secret");

        let config = parse_config(sample_config()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.storage.bucket, "segment-metadata");
        assert_eq!(config.export.batch_limit(), Some(1000));
        assert_eq!(config.sfm.comment_marker, "#");
        assert_eq!(config.logging.local_rotation, "daily");
    }

    #[test]
    fn test_sample_config_is_complete() {
        let sample = sample_config();
        assert!(sample.contains("comment_marker = \"#\""));
        assert!(sample.contains("[logging]"));
        assert!(sample.trim_end().ends_with("# daily | hourly | never"));
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("sfm-exporter.toml");
        std::fs::write(&output, "existing").unwrap();

        let args = InitArgs {
            output: output.to_str().unwrap().to_string(),
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "existing");

        let args = InitArgs {
            output: output.to_str().unwrap().to_string(),
            force: true,
        };
        assert_eq!(args.execute().await.unwrap(), 0);
        assert!(std::fs::read_to_string(&output)
            .unwrap()
            .contains("sentinel_key"));
    }
}

//! Configuration management.
//!
//! TOML configuration with `${VAR}` substitution, `SFMX_*` environment
//! overrides, defaults for every optional setting, and validation on load.
//! The loaded [`ExporterConfig`] is immutable and is passed explicitly into
//! every component constructor.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sfm_exporter::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("sfm-exporter.toml")?;
//!
//! println!("Bucket: {}", config.storage.bucket);
//! println!("Batch size: {}", config.export.batch_size);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`StorageConfig`] - Object storage target, bucket and credentials
//! - [`ExportConfig`] - Data directory, batching, compression, temp directory
//! - [`SfmConfig`] - Comment marker, separator, sentinel key and anchors
//! - [`LoggingConfig`] - Local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [storage]
//! bucket = "segment-metadata"
//! region = "eu-west-1"
//! access_key = "${SFMX_ACCESS_KEY}"
//! secret_key = "${SFMX_SECRET_KEY}"
//!
//! [export]
//! data_dir = "data"
//! batch_size = 1000
//! compression = true
//! temp_dir = "/tmp/sfm-exporter"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, ExportConfig, ExporterConfig, LoggingConfig, MissingAnchorPolicy,
    SfmConfig, StorageConfig, StorageTarget,
};
pub use secret::{secret_string, SecretString, SecretValue};

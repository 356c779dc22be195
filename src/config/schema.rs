//! Configuration schema types
//!
//! This module defines the configuration structure that maps to the TOML file.
//! The loaded value is immutable and handed to every component that needs it.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Object storage target selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageTarget {
    /// Amazon S3 or an S3-compatible store
    #[default]
    S3,
    /// A local directory tree (offline runs, testing)
    Local,
}

/// Behavior when the sentinel is absent and no anchor line exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissingAnchorPolicy {
    /// Report a state update error (the file is re-exported next run)
    #[default]
    Error,
    /// Leave the file untouched and log a warning
    Ignore,
}

/// Main exporter configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Object storage settings
    pub storage: StorageConfig,

    /// Export pipeline settings
    #[serde(default)]
    pub export: ExportConfig,

    /// SFM text format settings
    #[serde(default)]
    pub sfm: SfmConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ExporterConfig {
    /// Loads and validates a configuration file
    ///
    /// Shorthand for [`crate::config::load_config`].
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::domain::Result<Self> {
        crate::config::load_config(path)
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.storage.validate()?;
        self.export.validate()?;
        self.sfm.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Object storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage backend
    #[serde(default)]
    pub target: StorageTarget,

    /// Bucket name (required for s3)
    #[serde(default)]
    pub bucket: String,

    /// Region
    #[serde(default = "default_region")]
    pub region: String,

    /// Custom endpoint for S3-compatible stores (MinIO, Ceph, ...)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Access key; the default AWS credential chain is used when absent
    #[serde(default)]
    pub access_key: Option<SecretString>,

    /// Secret key; must be set together with `access_key`
    #[serde(default)]
    pub secret_key: Option<SecretString>,

    /// Use path-style addressing
    #[serde(default)]
    pub path_style: bool,

    /// Root directory for the local target
    #[serde(default)]
    pub local_root: Option<PathBuf>,

    /// Prefix prepended to every object key
    #[serde(default)]
    pub prefix: Option<String>,
}

impl StorageConfig {
    fn validate(&self) -> Result<(), String> {
        match self.target {
            StorageTarget::S3 => {
                if self.bucket.trim().is_empty() {
                    return Err("storage.bucket is required when storage.target = 's3'".to_string());
                }
                if self.region.trim().is_empty() {
                    return Err("storage.region cannot be empty".to_string());
                }
                if self.access_key.is_some() != self.secret_key.is_some() {
                    return Err(
                        "storage.access_key and storage.secret_key must be set together"
                            .to_string(),
                    );
                }
                if let Some(endpoint) = &self.endpoint {
                    if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                        return Err(format!(
                            "storage.endpoint must start with http:// or https://, got '{endpoint}'"
                        ));
                    }
                }
            }
            StorageTarget::Local => {
                if self.local_root.is_none() {
                    return Err(
                        "storage.local_root is required when storage.target = 'local'".to_string(),
                    );
                }
            }
        }

        if let Some(prefix) = &self.prefix {
            if prefix.starts_with('/') {
                return Err("storage.prefix must not start with '/'".to_string());
            }
        }

        Ok(())
    }

    /// Full object key for a pipeline key, with the configured prefix applied
    pub fn object_key(&self, key: &str) -> String {
        prefixed_key(self.prefix.as_deref(), key)
    }
}

/// Joins an optional key prefix and a key with a single `/`
pub fn prefixed_key(prefix: Option<&str>, key: &str) -> String {
    match prefix.map(|p| p.trim_end_matches('/')) {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}/{key}"),
        _ => key.to_string(),
    }
}

/// Export pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory scanned recursively for SFM files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Extension (without dot) of files to export
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    /// Records per batch; zero or negative means one unbounded batch per file
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,

    /// Compress artifacts before upload (kept only when strictly smaller)
    #[serde(default = "default_true")]
    pub compression: bool,

    /// Directory for local JSON Lines artifacts
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Records written between writer flushes
    #[serde(default = "default_flush_interval")]
    pub flush_interval: usize,

    /// Keep local artifacts after a successful upload
    #[serde(default)]
    pub keep_artifacts: bool,

    /// Graceful shutdown timeout in seconds
    /// Maximum time to wait for the current file to finish after a signal.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,

    /// Convert and batch without uploading or marking files
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            file_extension: default_file_extension(),
            batch_size: default_batch_size(),
            compression: true,
            temp_dir: default_temp_dir(),
            flush_interval: default_flush_interval(),
            keep_artifacts: false,
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
            dry_run: false,
        }
    }
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.file_extension.trim().is_empty() || self.file_extension.starts_with('.') {
            return Err(format!(
                "export.file_extension must be a bare extension like 'sfm', got '{}'",
                self.file_extension
            ));
        }

        if self.flush_interval == 0 {
            return Err("export.flush_interval must be > 0".to_string());
        }

        if self.temp_dir.as_os_str().is_empty() {
            return Err("export.temp_dir cannot be empty".to_string());
        }

        Ok(())
    }

    /// Batch bound, `None` when every file goes into a single batch
    pub fn batch_limit(&self) -> Option<usize> {
        usize::try_from(self.batch_size).ok().filter(|n| *n > 0)
    }
}

/// SFM text format configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SfmConfig {
    /// Prefix marking comment lines (and the header line)
    #[serde(default = "default_comment_marker")]
    pub comment_marker: String,

    /// Column separator
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Key of the embedded export sentinel
    #[serde(default = "default_sentinel_key")]
    pub sentinel_key: String,

    /// Substrings identifying the line after which a missing sentinel is inserted
    #[serde(default = "default_anchor_patterns")]
    pub anchor_patterns: Vec<String>,

    /// What to do when the sentinel is absent and no anchor line exists
    #[serde(default)]
    pub missing_anchor: MissingAnchorPolicy,
}

impl Default for SfmConfig {
    fn default() -> Self {
        Self {
            comment_marker: default_comment_marker(),
            separator: default_separator(),
            sentinel_key: default_sentinel_key(),
            anchor_patterns: default_anchor_patterns(),
            missing_anchor: MissingAnchorPolicy::default(),
        }
    }
}

impl SfmConfig {
    fn validate(&self) -> Result<(), String> {
        if self.comment_marker.is_empty() {
            return Err("sfm.comment_marker cannot be empty".to_string());
        }
        if self.separator.is_empty() {
            return Err("sfm.separator cannot be empty".to_string());
        }
        if self.comment_marker == self.separator {
            return Err("sfm.comment_marker and sfm.separator must differ".to_string());
        }

        let key = &self.sentinel_key;
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!(
                "sfm.sentinel_key must be a non-empty identifier, got '{key}'"
            ));
        }

        if self.anchor_patterns.iter().any(|p| p.is_empty()) {
            return Err("sfm.anchor_patterns cannot contain empty patterns".to_string());
        }

        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_file_extension() -> String {
    "sfm".to_string()
}

fn default_batch_size() -> i64 {
    1000
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("/tmp/sfm-exporter")
}

fn default_flush_interval() -> usize {
    1000
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

fn default_comment_marker() -> String {
    "#".to_string()
}

fn default_separator() -> String {
    ",".to_string()
}

fn default_sentinel_key() -> String {
    "jsonS3Exported".to_string()
}

fn default_anchor_patterns() -> Vec<String> {
    vec![".sfm".to_string(), "segmeta.json".to_string()]
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret::secret_string;

    fn s3_storage() -> StorageConfig {
        StorageConfig {
            target: StorageTarget::S3,
            bucket: "segments".to_string(),
            region: "eu-west-1".to_string(),
            endpoint: None,
            access_key: None,
            secret_key: None,
            path_style: false,
            local_root: None,
            prefix: None,
        }
    }

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig::default();
        assert!(config.validate().is_ok());

        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_storage_config_s3_validation() {
        let mut config = s3_storage();
        assert!(config.validate().is_ok());

        config.bucket = String::new();
        assert!(config.validate().is_err());

        config.bucket = "segments".to_string();
        config.access_key = Some(secret_string("AKIA".to_string()));
        assert!(config.validate().is_err());

        config.secret_key = Some(secret_string("secret".to_string()));
        assert!(config.validate().is_ok());

        config.endpoint = Some("minio:9000".to_string());
        assert!(config.validate().is_err());

        config.endpoint = Some("http://minio:9000".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_storage_config_local_requires_root() {
        let mut config = s3_storage();
        config.target = StorageTarget::Local;
        assert!(config.validate().is_err());

        config.local_root = Some(PathBuf::from("/tmp/out"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_object_key_prefix() {
        let mut config = s3_storage();
        assert_eq!(config.object_key("a/batch-0.json"), "a/batch-0.json");

        config.prefix = Some("exports/".to_string());
        assert_eq!(config.object_key("a/batch-0.json"), "exports/a/batch-0.json");

        config.prefix = Some("/abs".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_export_config_validation() {
        let mut config = ExportConfig::default();
        assert!(config.validate().is_ok());

        config.file_extension = ".sfm".to_string();
        assert!(config.validate().is_err());

        config.file_extension = "sfm".to_string();
        config.flush_interval = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_batch_limit() {
        let mut config = ExportConfig::default();
        assert_eq!(config.batch_limit(), Some(1000));

        config.batch_size = 0;
        assert_eq!(config.batch_limit(), None);

        config.batch_size = -5;
        assert_eq!(config.batch_limit(), None);
    }

    #[test]
    fn test_sfm_config_validation() {
        let mut config = SfmConfig::default();
        assert!(config.validate().is_ok());

        config.separator = "#".to_string();
        assert!(config.validate().is_err());

        config.separator = "|".to_string();
        config.sentinel_key = "json S3".to_string();
        assert!(config.validate().is_err());

        config.sentinel_key = "exported".to_string();
        config.anchor_patterns = vec![String::new()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(!config.local_enabled);
        assert_eq!(config.local_path, "logs");
        assert_eq!(config.local_rotation, "daily");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_values() {
        assert_eq!(default_log_level(), "info");
        assert_eq!(default_batch_size(), 1000);
        assert_eq!(default_flush_interval(), 1000);
        assert_eq!(default_sentinel_key(), "jsonS3Exported");
        assert_eq!(default_temp_dir(), PathBuf::from("/tmp/sfm-exporter"));
        assert_eq!(MissingAnchorPolicy::default(), MissingAnchorPolicy::Error);
    }
}

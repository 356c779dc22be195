//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{ExporterConfig, MissingAnchorPolicy, StorageTarget};
use super::secret::secret_string;
use crate::domain::errors::ExporterError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into ExporterConfig
/// 4. Applies environment variable overrides (SFMX_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use sfm_exporter::config::loader::load_config;
///
/// let config = load_config("sfm-exporter.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ExporterConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ExporterError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ExporterError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let config = parse_config(&contents)?;

    config.validate().map_err(|e| {
        ExporterError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Parses configuration text without validating it
///
/// Substitution and environment overrides are applied.
pub fn parse_config(contents: &str) -> Result<ExporterConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: ExporterConfig = toml::from_str(&contents)
        .map_err(|e| ExporterError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ExporterError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(ExporterError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(val) => val.trim().parse().map(Some).map_err(|_| {
            ExporterError::Configuration(format!("Invalid value for {name}: '{val}'"))
        }),
        Err(_) => Ok(None),
    }
}

/// Applies environment variable overrides using SFMX_* prefix
///
/// Environment variables follow the pattern: SFMX_<SECTION>_<KEY>
/// For example: SFMX_STORAGE_BUCKET, SFMX_EXPORT_BATCH_SIZE
fn apply_env_overrides(config: &mut ExporterConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("SFMX_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Storage overrides
    if let Ok(val) = std::env::var("SFMX_STORAGE_TARGET") {
        config.storage.target = match val.to_lowercase().as_str() {
            "s3" => StorageTarget::S3,
            "local" => StorageTarget::Local,
            _ => {
                return Err(ExporterError::Configuration(format!(
                    "Invalid SFMX_STORAGE_TARGET '{val}'. Must be one of: s3, local"
                )))
            }
        };
    }
    if let Ok(val) = std::env::var("SFMX_STORAGE_BUCKET") {
        config.storage.bucket = val;
    }
    if let Ok(val) = std::env::var("SFMX_STORAGE_REGION") {
        config.storage.region = val;
    }
    if let Ok(val) = std::env::var("SFMX_STORAGE_ENDPOINT") {
        config.storage.endpoint = Some(val);
    }
    if let Ok(val) = std::env::var("SFMX_STORAGE_ACCESS_KEY") {
        config.storage.access_key = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("SFMX_STORAGE_SECRET_KEY") {
        config.storage.secret_key = Some(secret_string(val));
    }
    if let Some(path_style) = env_parse("SFMX_STORAGE_PATH_STYLE")? {
        config.storage.path_style = path_style;
    }
    if let Ok(val) = std::env::var("SFMX_STORAGE_LOCAL_ROOT") {
        config.storage.local_root = Some(PathBuf::from(val));
    }
    if let Ok(val) = std::env::var("SFMX_STORAGE_PREFIX") {
        config.storage.prefix = Some(val);
    }

    // Export overrides
    if let Ok(val) = std::env::var("SFMX_EXPORT_DATA_DIR") {
        config.export.data_dir = PathBuf::from(val);
    }
    if let Some(batch_size) = env_parse("SFMX_EXPORT_BATCH_SIZE")? {
        config.export.batch_size = batch_size;
    }
    if let Some(compression) = env_parse("SFMX_EXPORT_COMPRESSION")? {
        config.export.compression = compression;
    }
    if let Ok(val) = std::env::var("SFMX_EXPORT_TEMP_DIR") {
        config.export.temp_dir = PathBuf::from(val);
    }
    if let Some(flush_interval) = env_parse("SFMX_EXPORT_FLUSH_INTERVAL")? {
        config.export.flush_interval = flush_interval;
    }
    if let Some(keep) = env_parse("SFMX_EXPORT_KEEP_ARTIFACTS")? {
        config.export.keep_artifacts = keep;
    }
    if let Some(dry_run) = env_parse("SFMX_EXPORT_DRY_RUN")? {
        config.export.dry_run = dry_run;
    }

    // SFM format overrides
    if let Ok(val) = std::env::var("SFMX_SFM_SEPARATOR") {
        config.sfm.separator = val;
    }
    if let Ok(val) = std::env::var("SFMX_SFM_SENTINEL_KEY") {
        config.sfm.sentinel_key = val;
    }
    if let Ok(val) = std::env::var("SFMX_SFM_MISSING_ANCHOR") {
        config.sfm.missing_anchor = match val.to_lowercase().as_str() {
            "error" => MissingAnchorPolicy::Error,
            "ignore" => MissingAnchorPolicy::Ignore,
            _ => {
                return Err(ExporterError::Configuration(format!(
                    "Invalid SFMX_SFM_MISSING_ANCHOR '{val}'. Must be one of: error, ignore"
                )))
            }
        };
    }

    // Logging overrides
    if let Some(enabled) = env_parse("SFMX_LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = enabled;
    }
    if let Ok(val) = std::env::var("SFMX_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

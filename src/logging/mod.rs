//! Logging and observability
//!
//! Structured logging through `tracing`:
//! - Console output, always on
//! - Optional JSON file logging with daily, hourly or no rotation
//! - Level from configuration or CLI, overridden by `RUST_LOG`
//!
//! # Example
//!
//! ```no_run
//! use sfm_exporter::logging::init_logging;
//! use sfm_exporter::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use sfm_exporter::log_error_with_context;
/// use sfm_exporter::domain::ExporterError;
///
/// let error = ExporterError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

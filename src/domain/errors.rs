//! Domain error types
//!
//! This module defines the error hierarchy for the exporter. Errors are
//! domain-specific and don't expose third-party SDK types.

use thiserror::Error;

/// Main exporter error type
///
/// Every fallible library operation returns this error. Per-record shape
/// mismatches are not errors; they are counted on the file report instead.
#[derive(Debug, Error)]
pub enum ExporterError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Open/read/write failures on local files
    #[error("I/O error: {0}")]
    Io(String),

    /// No header line was found before end of stream
    #[error("Column header not found in {0}")]
    SchemaNotFound(String),

    /// Compressing a finalized artifact failed
    #[error("Compression error: {0}")]
    Compression(String),

    /// Uploading a finalized artifact failed
    #[error("Upload error: {0}")]
    Upload(#[source] StorageError),

    /// Reading or writing the export sentinel failed
    #[error("State update error: {0}")]
    StateUpdate(String),

    /// Object storage errors outside the upload path (list/get/delete)
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Object storage errors
///
/// Errors raised by blob store implementations. These errors don't expose
/// third-party SDK types.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to build a client or reach the store
    #[error("Failed to connect to object storage: {0}")]
    ConnectionFailed(String),

    /// Failed to put an object
    #[error("Failed to put object {key}: {message}")]
    PutFailed { key: String, message: String },

    /// Failed to get an object
    #[error("Failed to get object {key}: {message}")]
    GetFailed { key: String, message: String },

    /// Failed to list objects
    #[error("Failed to list objects under {prefix}: {message}")]
    ListFailed { prefix: String, message: String },

    /// Failed to delete an object
    #[error("Failed to delete object {key}: {message}")]
    DeleteFailed { key: String, message: String },

    /// Object does not exist
    #[error("Object not found: {0}")]
    NotFound(String),
}

impl StorageError {
    pub fn is_connection_error(&self) -> bool {
        matches!(self, StorageError::ConnectionFailed(_))
    }
}

impl ExporterError {
    /// Whether the error came from the storage connection rather than the data
    pub fn is_connection_error(&self) -> bool {
        match self {
            ExporterError::Storage(e) | ExporterError::Upload(e) => e.is_connection_error(),
            _ => false,
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for ExporterError {
    fn from(err: std::io::Error) -> Self {
        ExporterError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for ExporterError {
    fn from(err: serde_json::Error) -> Self {
        ExporterError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for ExporterError {
    fn from(err: toml::de::Error) -> Self {
        ExporterError::Configuration(format!("TOML parse error: {err}"))
    }
}

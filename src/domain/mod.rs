//! Domain models and types for the exporter.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Source identity** ([`SourceFile`]) and deterministic upload keys
//! - **Data model** ([`HeaderSchema`], [`Record`])
//! - **Error types** ([`ExporterError`], [`StorageError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, ExporterError>`]:
//!
//! ```rust
//! use sfm_exporter::domain::{ExporterError, Result};
//!
//! fn example() -> Result<()> {
//!     let config = sfm_exporter::config::ExporterConfig::from_file("sfm-exporter.toml")?;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod record;
pub mod result;
pub mod source;

// Re-export commonly used types for convenience
pub use errors::{ExporterError, StorageError};
pub use record::{HeaderSchema, Record};
pub use result::Result;
pub use source::SourceFile;

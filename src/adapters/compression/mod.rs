//! Artifact compression
//!
//! The pipeline sees compression through the [`Compressor`] trait. A
//! compressor returns the compressed sibling only when it is strictly smaller
//! than the original; otherwise the sibling is discarded and the original
//! path comes back unchanged.

pub mod gzip;

pub use gzip::{decompress_file, GzipCompressor};

use crate::domain::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Compressor collaborator
#[async_trait]
pub trait Compressor: Send + Sync {
    /// Extension of compressed artifacts, without the dot
    fn extension(&self) -> &str;

    /// Compress `path` into a sibling file
    ///
    /// Returns the path to upload: the compressed sibling, or `path` itself
    /// when compressing did not make it smaller.
    ///
    /// # Errors
    ///
    /// Returns a compression error if the codec or the file system fails.
    async fn compress(&self, path: &Path) -> Result<PathBuf>;
}

/// Keeps whichever of the two files is strictly smaller, deleting the other
/// only if it is the compressed one
pub fn keep_if_smaller(original: &Path, compressed: &Path) -> std::io::Result<PathBuf> {
    let original_size = std::fs::metadata(original)?.len();
    let compressed_size = std::fs::metadata(compressed)?.len();

    if compressed_size < original_size {
        Ok(compressed.to_path_buf())
    } else {
        std::fs::remove_file(compressed)?;
        Ok(original.to_path_buf())
    }
}

/// Path of the compressed sibling: the original path plus `.{extension}`
pub fn sibling_path(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

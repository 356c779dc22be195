//! Source file identity
//!
//! A [`SourceFile`] is one discovered SFM file. Its base name (the file stem)
//! is the prefix of every object key uploaded for it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// One discovered SFM file
///
/// # Examples
///
/// ```
/// use sfm_exporter::domain::SourceFile;
///
/// let file = SourceFile::new("data/run-7/segments.sfm").unwrap();
/// assert_eq!(file.base_name(), "segments");
/// assert_eq!(file.batch_key(2, None), "segments/batch-2.json");
/// assert_eq!(file.batch_key(2, Some("gz")), "segments/batch-2.json.gz");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceFile {
    path: PathBuf,
    base_name: String,
}

impl SourceFile {
    /// Creates a source file from a path
    ///
    /// Fails if the path has no usable file stem.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, String> {
        let path = path.into();
        let base_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.trim().is_empty())
            .ok_or_else(|| format!("Source file has no file name: {}", path.display()))?;

        Ok(Self { path, base_name })
    }

    /// Path of the file on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without directory and extension
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Object key prefix shared by every batch of this file
    pub fn key_prefix(&self) -> String {
        format!("{}/", self.base_name)
    }

    /// Deterministic object key for one batch
    ///
    /// `compressed_extension` is appended only when the uploaded artifact is
    /// the compressed form.
    pub fn batch_key(&self, batch_index: usize, compressed_extension: Option<&str>) -> String {
        match compressed_extension {
            Some(ext) => format!("{}/batch-{batch_index}.json.{ext}", self.base_name),
            None => format!("{}/batch-{batch_index}.json", self.base_name),
        }
    }
}

impl fmt::Display for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

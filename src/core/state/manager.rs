//! Export state tracker
//!
//! Reads and writes the per-file export sentinel. Only a line holding nothing
//! but the sentinel, or a comment line, carries it; data rows never do. The
//! read path streams the file and stops at the first such line. The write path
//! works on raw bytes, flips or inserts the sentinel, and replaces the file
//! atomically.

use crate::config::{MissingAnchorPolicy, SfmConfig};
use crate::core::state::sentinel::{ExportState, SentinelField};
use crate::core::transform::lines::{split_terminator, LineReader};
use crate::domain::{ExporterError, Result, SourceFile};
use std::path::{Path, PathBuf};
use tokio::io::BufReader;

/// Result of marking a file as exported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// The sentinel was already `true`; the file was not touched
    AlreadyExported,
    /// An existing `false` sentinel was flipped to `true`
    Flipped,
    /// A new sentinel line was inserted after the anchor line
    Inserted,
    /// No sentinel and no anchor line; the file was not touched
    NoAnchor,
}

/// Sentinel carried by a line body, if the line is a metadata line
///
/// Lines that are not valid UTF-8 never carry the sentinel.
fn metadata_field(body: &[u8], sfm: &SfmConfig) -> Option<SentinelField> {
    let line = std::str::from_utf8(body).ok()?;
    SentinelField::parse_metadata(line, &sfm.sentinel_key, &sfm.comment_marker)
}

/// Reads the export state from file content
///
/// The first sentinel on a metadata line decides the state.
pub fn read_state(content: &[u8], sfm: &SfmConfig) -> ExportState {
    content
        .split_inclusive(|b| *b == b'\n')
        .find_map(|raw| metadata_field(split_terminator(raw).0, sfm))
        .map_or(ExportState::Absent, |field| field.state())
}

/// Computes the content of a file after marking it as exported
///
/// Returns `None` as the new content when the file must stay untouched.
/// Every line other than the sentinel line is copied byte for byte.
pub fn mark_content(content: &[u8], sfm: &SfmConfig) -> (MarkOutcome, Option<Vec<u8>>) {
    let lines: Vec<&[u8]> = content.split_inclusive(|b| *b == b'\n').collect();

    for (index, raw) in lines.iter().enumerate() {
        let (body, terminator) = split_terminator(raw);
        let Some(field) = metadata_field(body, sfm) else {
            continue;
        };
        if field.value() {
            return (MarkOutcome::AlreadyExported, None);
        }

        let mut updated = Vec::with_capacity(content.len() + 1);
        for line in &lines[..index] {
            updated.extend_from_slice(line);
        }
        updated.extend_from_slice(field.with_value(true).to_string().as_bytes());
        updated.extend_from_slice(terminator);
        for line in &lines[index + 1..] {
            updated.extend_from_slice(line);
        }
        return (MarkOutcome::Flipped, Some(updated));
    }

    let anchor = lines.iter().position(|raw| {
        let body = String::from_utf8_lossy(split_terminator(raw).0);
        sfm.anchor_patterns.iter().any(|p| body.contains(p.as_str()))
    });
    let Some(anchor) = anchor else {
        return (MarkOutcome::NoAnchor, None);
    };

    let mut updated = Vec::with_capacity(content.len() + sfm.sentinel_key.len() + 8);
    for line in &lines[..=anchor] {
        updated.extend_from_slice(line);
    }
    let (_, anchor_terminator) = split_terminator(lines[anchor]);
    let newline: &[u8] = if anchor_terminator.is_empty() {
        updated.push(b'\n');
        b"\n"
    } else {
        anchor_terminator
    };
    updated.extend_from_slice(SentinelField::new(&sfm.sentinel_key, true).to_string().as_bytes());
    if anchor + 1 < lines.len() {
        updated.extend_from_slice(newline);
    }
    for line in &lines[anchor + 1..] {
        updated.extend_from_slice(line);
    }

    (MarkOutcome::Inserted, Some(updated))
}

/// Export state tracker for SFM files
///
/// Invoked once per file before the pipeline (read) and once after every
/// batch of the file uploaded successfully (write).
#[derive(Debug, Clone)]
pub struct ExportStateTracker {
    sfm: SfmConfig,
}

impl ExportStateTracker {
    /// Create a tracker for the configured SFM format
    pub fn new(sfm: SfmConfig) -> Self {
        Self { sfm }
    }

    /// Load the export state of a file
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened or read.
    pub async fn load_state(&self, file: &SourceFile) -> Result<ExportState> {
        let handle = tokio::fs::File::open(file.path()).await.map_err(|e| {
            ExporterError::Io(format!("Failed to open {}: {}", file.path().display(), e))
        })?;
        let mut lines = LineReader::new(BufReader::new(handle));

        while let Some(body) = lines.next_bytes().await.map_err(|e| {
            ExporterError::Io(format!("Failed to read {}: {}", file.path().display(), e))
        })? {
            if let Some(field) = metadata_field(body, &self.sfm) {
                return Ok(field.state());
            }
        }

        Ok(ExportState::Absent)
    }

    /// Whether the file was already exported
    pub async fn is_exported(&self, file: &SourceFile) -> Result<bool> {
        Ok(self.load_state(file).await?.is_exported())
    }

    /// Mark a file as exported
    ///
    /// Marking an already exported file leaves it byte-identical.
    ///
    /// # Errors
    ///
    /// Returns a state update error if the file cannot be read or replaced,
    /// or if no anchor line exists and the missing-anchor policy is `error`.
    pub async fn mark_exported(&self, file: &SourceFile) -> Result<MarkOutcome> {
        let path = file.path();
        let content = tokio::fs::read(path).await.map_err(|e| {
            ExporterError::StateUpdate(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let (outcome, updated) = mark_content(&content, &self.sfm);

        match (outcome, updated) {
            (MarkOutcome::NoAnchor, _) => match self.sfm.missing_anchor {
                MissingAnchorPolicy::Error => {
                    return Err(ExporterError::StateUpdate(format!(
                        "No '{}' sentinel and no anchor line ({}) in {}",
                        self.sfm.sentinel_key,
                        self.sfm.anchor_patterns.join(", "),
                        path.display()
                    )));
                }
                MissingAnchorPolicy::Ignore => {
                    tracing::warn!(
                        file = %path.display(),
                        "No sentinel and no anchor line, export state not recorded"
                    );
                }
            },
            (_, Some(updated)) => {
                replace_file(path, &updated).await?;
                tracing::debug!(file = %path.display(), outcome = ?outcome, "Export state recorded");
            }
            (_, None) => {
                tracing::debug!(file = %path.display(), "Export state already recorded");
            }
        }

        Ok(outcome)
    }
}

/// Replaces a file by writing a sibling and renaming it over the original
async fn replace_file(path: &Path, content: &[u8]) -> Result<()> {
    let mut staging = path.as_os_str().to_owned();
    staging.push(".sfmx-tmp");
    let staging = PathBuf::from(staging);

    tokio::fs::write(&staging, content).await.map_err(|e| {
        ExporterError::StateUpdate(format!("Failed to write {}: {}", staging.display(), e))
    })?;

    if let Err(e) = tokio::fs::rename(&staging, path).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(ExporterError::StateUpdate(format!(
            "Failed to replace {}: {}",
            path.display(),
            e
        )));
    }

    Ok(())
}

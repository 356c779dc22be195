//! Header schema resolution

use crate::config::SfmConfig;
use crate::domain::{ExporterError, HeaderSchema, Result, SourceFile};
use crate::core::transform::lines::LineReader;
use tokio::io::AsyncBufRead;

/// Parses a header line into a schema
///
/// A header line starts with the comment marker and contains the separator.
/// Returns `None` for any other line.
pub fn parse_header_line(line: &str, sfm: &SfmConfig) -> Option<HeaderSchema> {
    let body = line.trim().strip_prefix(sfm.comment_marker.as_str())?;
    if !body.contains(sfm.separator.as_str()) {
        return None;
    }

    let columns = body
        .split(sfm.separator.as_str())
        .map(|column| column.trim().to_string())
        .collect();
    HeaderSchema::new(columns).ok()
}

/// Scans a stream for the first header line
///
/// The stream is consumed up to and including the header; callers rewind
/// before the data pass.
///
/// # Errors
///
/// Returns `SchemaNotFound` if the stream ends without a header line, or an
/// I/O error if reading fails.
pub async fn resolve_header<R>(reader: R, sfm: &SfmConfig, file: &SourceFile) -> Result<HeaderSchema>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = LineReader::new(reader);

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| ExporterError::Io(format!("Failed to read {}: {}", file.path().display(), e)))?
    {
        if let Some(schema) = parse_header_line(&line, sfm) {
            tracing::debug!(
                file = %file,
                columns = schema.arity(),
                "Resolved header schema"
            );
            return Ok(schema);
        }
    }

    Err(ExporterError::SchemaNotFound(file.path().display().to_string()))
}

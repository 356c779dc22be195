//! Result type alias for the exporter

use super::errors::ExporterError;

/// Result type alias for exporter operations
///
/// # Examples
///
/// ```
/// use sfm_exporter::domain::result::Result;
/// use sfm_exporter::domain::errors::ExporterError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(ExporterError::Other("boom".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ExporterError>;

//! Line to record transformation

use crate::config::SfmConfig;
use crate::core::state::SentinelField;
use crate::domain::{HeaderSchema, Record};

/// What a single input line turned into
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// A well-formed data line
    Record(Record),
    /// Blank, comment or sentinel line
    Skipped,
    /// Field count differs from the header arity
    Mismatch { found: usize },
}

/// Converts data lines into records keyed by the header schema
///
/// Stateless across lines, so processing can restart at any line boundary.
#[derive(Debug, Clone)]
pub struct RecordTransformer {
    schema: HeaderSchema,
    sfm: SfmConfig,
}

impl RecordTransformer {
    pub fn new(schema: HeaderSchema, sfm: SfmConfig) -> Self {
        Self { schema, sfm }
    }

    pub fn schema(&self) -> &HeaderSchema {
        &self.schema
    }

    /// Transforms one line (without its terminator)
    pub fn transform_line(&self, line: &str) -> LineOutcome {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(self.sfm.comment_marker.as_str()) {
            return LineOutcome::Skipped;
        }

        let sfm = &self.sfm;
        if SentinelField::parse_metadata(trimmed, &sfm.sentinel_key, &sfm.comment_marker).is_some() {
            return LineOutcome::Skipped;
        }

        let fields: Vec<&str> = line.split(self.sfm.separator.as_str()).collect();
        let found = fields.len();
        match Record::from_fields(&self.schema, fields) {
            Some(record) => LineOutcome::Record(record),
            None => LineOutcome::Mismatch { found },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transformer() -> RecordTransformer {
        let schema = HeaderSchema::new(vec!["id".to_string(), "name".to_string()]).unwrap();
        RecordTransformer::new(schema, SfmConfig::default())
    }

    fn json(outcome: LineOutcome) -> String {
        match outcome {
            LineOutcome::Record(record) => record.to_json_line().unwrap(),
            other => panic!("expected a record, got {other:?}"),
        }
    }

    #[test]
    fn test_well_formed_line() {
        assert_eq!(
            json(transformer().transform_line("1,alice")),
            r#"{"id":"1","name":"alice"}"#
        );
        assert_eq!(
            json(transformer().transform_line("  2 ,  bob  ")),
            r#"{"id":"2","name":"bob"}"#
        );
    }

    #[test]
    fn test_skipped_lines() {
        let t = transformer();
        assert_eq!(t.transform_line(""), LineOutcome::Skipped);
        assert_eq!(t.transform_line("   "), LineOutcome::Skipped);
        assert_eq!(t.transform_line("#id,name"), LineOutcome::Skipped);
        assert_eq!(t.transform_line("  # note"), LineOutcome::Skipped);
        assert_eq!(t.transform_line("jsonS3Exported: false"), LineOutcome::Skipped);
    }

    #[test]
    fn test_arity_mismatch() {
        let t = transformer();
        assert_eq!(t.transform_line("1"), LineOutcome::Mismatch { found: 1 });
        assert_eq!(t.transform_line("1,a,extra"), LineOutcome::Mismatch { found: 3 });
    }

    #[test]
    fn test_sentinel_text_in_data_row_is_a_record() {
        assert_eq!(
            json(transformer().transform_line("1,jsonS3Exported: false")),
            r#"{"id":"1","name":"jsonS3Exported: false"}"#
        );
    }

    #[test]
    fn test_empty_values_are_kept() {
        assert_eq!(
            json(transformer().transform_line("3,")),
            r#"{"id":"3","name":""}"#
        );
    }
}

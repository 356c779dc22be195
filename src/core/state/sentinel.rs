//! Export sentinel model
//!
//! The sentinel is a `key:bool` pair embedded in an SFM file. It is parsed
//! into a typed [`SentinelField`] that serializes back to the exact original
//! text, so flipping the value never touches adjacent content.
//!
//! Matching is token-bounded: `jsonS3ExportedAt: true` or
//! `xjsonS3Exported: true` are not the sentinel `jsonS3Exported`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Export state recorded in a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportState {
    /// No sentinel present
    Absent,
    /// Sentinel present with a `false` value
    NotExported,
    /// Sentinel present with a `true` value
    Exported,
}

impl ExportState {
    /// Whether the file was already exported
    pub fn is_exported(self) -> bool {
        self == ExportState::Exported
    }
}

impl fmt::Display for ExportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExportState::Absent => "absent",
            ExportState::NotExported => "not exported",
            ExportState::Exported => "exported",
        };
        write!(f, "{label}")
    }
}

/// One sentinel occurrence within a line
///
/// `prefix + key + separator + value + suffix` reproduces the line exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelField {
    prefix: String,
    key: String,
    separator: String,
    value: bool,
    suffix: String,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn leading_blanks(s: &str) -> usize {
    s.len() - s.trim_start_matches([' ', '\t']).len()
}

impl SentinelField {
    /// Parses the first sentinel occurrence in a line (without line terminator)
    pub fn parse(line: &str, key: &str) -> Option<Self> {
        if key.is_empty() {
            return None;
        }

        for (start, _) in line.match_indices(key) {
            let before_ok = line[..start]
                .chars()
                .next_back()
                .map_or(true, |c| !is_ident_char(c));
            if !before_ok {
                continue;
            }

            let after_key = &line[start + key.len()..];
            let ws_before = leading_blanks(after_key);
            let Some(after_colon) = after_key[ws_before..].strip_prefix(':') else {
                continue;
            };
            let ws_after = leading_blanks(after_colon);
            let literal = &after_colon[ws_after..];

            let (value, literal_len) = if literal.starts_with("true") {
                (true, 4)
            } else if literal.starts_with("false") {
                (false, 5)
            } else {
                continue;
            };

            let rest = &literal[literal_len..];
            if rest.chars().next().is_some_and(is_ident_char) {
                continue;
            }

            let separator_len = ws_before + 1 + ws_after;
            return Some(Self {
                prefix: line[..start].to_string(),
                key: key.to_string(),
                separator: after_key[..separator_len].to_string(),
                value,
                suffix: rest.to_string(),
            });
        }

        None
    }

    /// Parses a sentinel that sits on a metadata line
    ///
    /// Only a line holding nothing but the sentinel, or a comment line
    /// starting with `comment_marker`, carries export state. A sentinel-like
    /// token inside a data row is record content and yields `None`.
    pub fn parse_metadata(line: &str, key: &str, comment_marker: &str) -> Option<Self> {
        let field = Self::parse(line, key)?;
        let is_comment =
            !comment_marker.is_empty() && line.trim_start().starts_with(comment_marker);
        (is_comment || field.is_standalone()).then_some(field)
    }

    /// A bare `key:value` field, as inserted into files without a sentinel
    pub fn new(key: impl Into<String>, value: bool) -> Self {
        Self {
            prefix: String::new(),
            key: key.into(),
            separator: ":".to_string(),
            value,
            suffix: String::new(),
        }
    }

    /// The boolean value
    pub fn value(&self) -> bool {
        self.value
    }

    /// Same field with a different value; all other text is kept
    pub fn with_value(mut self, value: bool) -> Self {
        self.value = value;
        self
    }

    /// Whether the line holds nothing but the sentinel
    pub fn is_standalone(&self) -> bool {
        self.prefix.trim().is_empty() && self.suffix.trim().is_empty()
    }

    /// State this field represents
    pub fn state(&self) -> ExportState {
        if self.value {
            ExportState::Exported
        } else {
            ExportState::NotExported
        }
    }
}

impl fmt::Display for SentinelField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}{}",
            self.prefix, self.key, self.separator, self.value, self.suffix
        )
    }
}

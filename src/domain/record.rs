//! Header schema and transformed records

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered column names parsed from a file's header line
///
/// Immutable once parsed. Always holds at least one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderSchema(Vec<String>);

impl HeaderSchema {
    /// Creates a schema from column names
    pub fn new(columns: Vec<String>) -> Result<Self, String> {
        if columns.is_empty() {
            return Err("Header schema must contain at least one column".to_string());
        }
        Ok(Self(columns))
    }

    /// Column names in header order
    pub fn columns(&self) -> &[String] {
        &self.0
    }

    /// Number of columns a data line must have
    pub fn arity(&self) -> usize {
        self.0.len()
    }
}

/// One data line keyed by column name, in header order
///
/// Serializes as a single JSON object whose keys follow the header.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Zips trimmed values with the schema's column names
    ///
    /// Returns `None` when the value count differs from the schema arity.
    pub fn from_fields<'a, I>(schema: &HeaderSchema, fields: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let values: Vec<&str> = fields.into_iter().collect();
        if values.len() != schema.arity() {
            return None;
        }

        let mut map = Map::with_capacity(values.len());
        for (column, value) in schema.columns().iter().zip(values) {
            map.insert(column.clone(), Value::String(value.trim().to_string()));
        }
        Some(Self(map))
    }

    /// Value of one column
    pub fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).and_then(Value::as_str)
    }

    /// Column names in output order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Serializes the record as one JSON Lines entry (without the newline)
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.0)
    }
}

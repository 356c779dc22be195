//! SFM parsing
//!
//! - [`header`] - Locates the header line and builds the [`HeaderSchema`](crate::domain::HeaderSchema)
//! - [`lines`] - Byte-level line splitting tolerant of invalid UTF-8
//! - [`record`] - Turns data lines into ordered [`Record`](crate::domain::Record)s

pub mod header;
pub mod lines;
pub mod record;

pub use header::{parse_header_line, resolve_header};
pub use lines::LineReader;
pub use record::{LineOutcome, RecordTransformer};

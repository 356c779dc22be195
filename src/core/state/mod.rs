//! Export state tracking
//!
//! Each SFM file records whether it was exported through a `key:bool`
//! sentinel embedded in the file itself.

pub mod manager;
pub mod sentinel;

pub use manager::{ExportStateTracker, MarkOutcome};
pub use sentinel::{ExportState, SentinelField};

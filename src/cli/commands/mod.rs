//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod export;
pub mod fetch;
pub mod init;
pub mod purge;
pub mod status;
pub mod validate;

//! External system integrations
//!
//! - [`storage`] - Object storage (S3, local directory, dry run)
//! - [`compression`] - Artifact compression (gzip)
//!
//! # Design Pattern
//!
//! Both collaborators sit behind `async-trait` traits ([`storage::BlobStore`]
//! and [`compression::Compressor`]) so the pipeline can be driven by test
//! doubles.
//!
//! ```rust,no_run
//! use sfm_exporter::adapters::storage::{BlobStore, LocalBlobStore};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = LocalBlobStore::new("/var/lib/sfm-exporter/out");
//! store
//!     .put(Path::new("/tmp/run-batch-0.json"), "run/batch-0.json", "application/x-ndjson")
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod compression;
pub mod storage;

// SFM Exporter - SFM files to JSON Lines on S3-compatible object storage
// Copyright (c) 2025 SFM Exporter Contributors
// Licensed under the MIT License

//! # SFM Exporter
//!
//! Converts segment-metadata (SFM) text files into JSON Lines batches and
//! uploads them to S3-compatible object storage. Each source file carries an
//! embedded `jsonS3Exported` sentinel, so a file is exported at most once and
//! a failed run is simply repeated.
//!
//! ## Overview
//!
//! - **Resolving** the column header of each file
//! - **Transforming** comma-separated rows into JSON objects keyed by column
//! - **Batching** records into bounded artifacts, optionally gzip-compressed
//! - **Uploading** each batch under a deterministic key `{file}/batch-{n}.json[.gz]`
//! - **Marking** the source file exported once every batch is acknowledged
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (export, transform, state)
//! - [`adapters`] - Compression and object storage
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sfm_exporter::config::ExporterConfig;
//! use sfm_exporter::core::export::ExportCoordinator;
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExporterConfig::from_file("sfm-exporter.toml")?;
//!     let (_shutdown_tx, shutdown_rx) = watch::channel(false);
//!
//!     let coordinator = ExportCoordinator::from_config(config, shutdown_rx).await?;
//!     let summary = coordinator.execute_export().await?;
//!
//!     println!(
//!         "Exported {} files, {} records",
//!         summary.files_exported, summary.records_written
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library operations return [`domain::Result`], built on
//! [`domain::ExporterError`]:
//!
//! ```rust,no_run
//! use sfm_exporter::domain::ExporterError;
//!
//! fn example() -> Result<(), ExporterError> {
//!     let config = sfm_exporter::config::ExporterConfig::from_file("sfm-exporter.toml")?;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;

//! Object storage integration
//!
//! - [`S3BlobStore`] - Amazon S3 and S3-compatible stores
//! - [`LocalBlobStore`] - a directory tree
//! - [`DryRunBlobStore`] - accepts uploads without sending them

pub mod dry_run;
pub mod factory;
pub mod local;
pub mod s3;
pub mod traits;

pub use dry_run::DryRunBlobStore;
pub use factory::create_blob_store;
pub use local::LocalBlobStore;
pub use s3::S3BlobStore;
pub use traits::{
    BlobStore, ObjectInfo, StorageResult, CONTENT_TYPE_GZIP, CONTENT_TYPE_NDJSON,
};

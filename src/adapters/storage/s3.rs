//! Amazon S3 (and S3-compatible) blob store

use super::traits::{BlobStore, ObjectInfo, StorageResult};
use crate::config::schema::prefixed_key;
use crate::config::StorageConfig;
use crate::domain::StorageError;
use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use secrecy::ExposeSecret;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

/// S3 blob store backed by `aws-sdk-s3`
#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
    prefix: Option<String>,
}

impl S3BlobStore {
    /// Build a client from the storage configuration
    ///
    /// Static credentials are used when both keys are configured, otherwise
    /// the default AWS credential chain.
    pub async fn new(config: &StorageConfig) -> StorageResult<Self> {
        let region = Region::new(config.region.clone());

        let mut builder = match (&config.access_key, &config.secret_key) {
            (Some(access_key), Some(secret_key)) => {
                let credentials = Credentials::new(
                    access_key.expose_secret().as_ref(),
                    secret_key.expose_secret().as_ref(),
                    None,
                    None,
                    "sfm-exporter",
                );
                aws_sdk_s3::Config::builder()
                    .credentials_provider(credentials)
                    .region(region)
            }
            _ => {
                let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
                    .region(region)
                    .load()
                    .await;
                aws_sdk_s3::config::Builder::from(&shared)
            }
        };

        builder = builder.force_path_style(config.path_style);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(builder.build());

        info!(
            bucket = %config.bucket,
            region = %config.region,
            endpoint = ?config.endpoint,
            "S3 client initialized"
        );

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            prefix: config.prefix.clone(),
        })
    }

    fn full_key(&self, key: &str) -> String {
        prefixed_key(self.prefix.as_deref(), key)
    }

    fn relative_key<'a>(&self, full: &'a str) -> &'a str {
        let stripped = self
            .prefix
            .as_deref()
            .map(|p| p.trim_end_matches('/'))
            .filter(|p| !p.is_empty())
            .and_then(|p| full.strip_prefix(p))
            .and_then(|rest| rest.strip_prefix('/'));
        stripped.unwrap_or(full)
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    fn describe(&self) -> String {
        match self.prefix.as_deref() {
            Some(prefix) => format!("s3://{}/{}", self.bucket, prefix.trim_end_matches('/')),
            None => format!("s3://{}", self.bucket),
        }
    }

    async fn test_connection(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| {
                StorageError::ConnectionFailed(format!(
                    "bucket {}: {}",
                    self.bucket,
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }

    #[instrument(skip(self, local), fields(bucket = %self.bucket))]
    async fn put(&self, local: &Path, key: &str, content_type: &str) -> StorageResult<()> {
        let full_key = self.full_key(key);
        let body = ByteStream::from_path(local)
            .await
            .map_err(|e| StorageError::PutFailed {
                key: full_key.clone(),
                message: format!("cannot read {}: {}", local.display(), e),
            })?;

        debug!("Uploading {} to s3://{}/{}", local.display(), self.bucket, full_key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| StorageError::PutFailed {
                key: full_key.clone(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(())
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<ObjectInfo>> {
        let full_prefix = self.full_key(prefix);
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(&full_prefix)
            .into_paginator()
            .send();

        let mut objects = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| StorageError::ListFailed {
                prefix: full_prefix.clone(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

            for object in page.contents() {
                if let Some(key) = object.key() {
                    objects.push(ObjectInfo {
                        key: self.relative_key(key).to_string(),
                        size: object.size().and_then(|s| u64::try_from(s).ok()).unwrap_or(0),
                    });
                }
            }
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    async fn get(&self, key: &str, local: &Path) -> StorageResult<u64> {
        let full_key = self.full_key(key);
        let response = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    return Err(StorageError::NotFound(full_key));
                }
                return Err(StorageError::GetFailed {
                    key: full_key,
                    message: DisplayErrorContext(&service_error).to_string(),
                });
            }
        };

        let written = write_body(response.body, local).await.map_err(|e| {
            StorageError::GetFailed {
                key: full_key.clone(),
                message: format!("cannot write {}: {}", local.display(), e),
            }
        })?;

        debug!(
            "Downloaded s3://{}/{} to {} ({} bytes)",
            self.bucket,
            full_key,
            local.display(),
            written
        );
        Ok(written)
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let full_key = self.full_key(key);
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .send()
            .await
            .map_err(|e| StorageError::DeleteFailed {
                key: full_key.clone(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        info!("Deleted s3://{}/{}", self.bucket, full_key);
        Ok(())
    }
}

/// Streams an object body to a local file and returns the byte count
///
/// A partially written file is removed on failure.
async fn write_body(body: ByteStream, local: &Path) -> std::io::Result<u64> {
    let reader = body.into_async_read();
    tokio::pin!(reader);

    let result = async {
        let mut file = tokio::fs::File::create(local).await?;
        let written = tokio::io::copy(&mut reader, &mut file).await?;
        file.flush().await?;
        Ok::<_, std::io::Error>(written)
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(local).await;
    }
    result
}

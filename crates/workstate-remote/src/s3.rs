//! S3 implementation of [`BlobStore`].
//!
//! Works with AWS S3 and S3-compatible services (MinIO, Wasabi, DigitalOcean
//! Spaces) when an endpoint is configured.

use crate::blob::{BlobStore, ObjectInfo};
use crate::credentials::Credentials;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Snapshot storage in an S3 bucket.
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    /// Builds a client from stored credentials.
    pub async fn connect(credentials: &Credentials) -> Result<Self> {
        credentials
            .validate()
            .context("Credentials are not configured correctly, run `workstate configure`")?;

        let provider = aws_sdk_s3::config::Credentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            None,
            None,
            "workstate",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(credentials.region.clone()))
            .credentials_provider(provider)
            .load()
            .await;

        let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&sdk_config);

        if let Some(endpoint_url) = credentials.endpoint.as_deref() {
            debug!("Using custom S3 endpoint: {}", endpoint_url);
            s3_config_builder = s3_config_builder
                .endpoint_url(endpoint_url)
                .force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(s3_config_builder.build()),
            bucket: credentials.bucket_name.clone(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn list(&self) -> Result<Vec<ObjectInfo>> {
        debug!("Listing objects in s3://{}", self.bucket);

        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(&self.bucket);

            if let Some(token) = continuation_token {
                request = request.continuation_token(token);
            }

            let resp = request
                .send()
                .await
                .with_context(|| format!("Failed to list objects in bucket {}", self.bucket))?;

            for object in resp.contents.unwrap_or_default() {
                let Some(key) = object.key else { continue };
                let last_modified = object
                    .last_modified
                    .and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos()));
                objects.push(ObjectInfo {
                    key,
                    size: object.size.unwrap_or(0).max(0) as u64,
                    last_modified,
                });
            }

            if resp.is_truncated == Some(true) {
                continuation_token = resp.next_continuation_token;
            } else {
                break;
            }
        }

        debug!("Found {} objects", objects.len());
        Ok(objects)
    }

    async fn put(&self, local_path: &Path, key: &str) -> Result<()> {
        debug!(
            "Uploading {} to s3://{}/{}",
            local_path.display(),
            self.bucket,
            key
        );

        let body = ByteStream::from_path(local_path)
            .await
            .with_context(|| format!("Failed to read {}", local_path.display()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type("application/zip")
            .send()
            .await
            .with_context(|| format!("Failed to upload {} to bucket {}", key, self.bucket))?;

        info!("Uploaded s3://{}/{}", self.bucket, key);
        Ok(())
    }

    async fn get(&self, key: &str, local_path: &Path) -> Result<()> {
        debug!(
            "Downloading s3://{}/{} to {}",
            self.bucket,
            key,
            local_path.display()
        );

        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("Failed to download {} from bucket {}", key, self.bucket))?;

        let mut file = tokio::fs::File::create(local_path)
            .await
            .with_context(|| format!("Failed to create {}", local_path.display()))?;

        let mut body = resp.body;
        let mut written = 0u64;
        while let Some(chunk) = body
            .try_next()
            .await
            .with_context(|| format!("Failed to read {} from bucket {}", key, self.bucket))?
        {
            file.write_all(&chunk)
                .await
                .with_context(|| format!("Failed to write {}", local_path.display()))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .with_context(|| format!("Failed to write {}", local_path.display()))?;

        info!(
            "Downloaded {} bytes from s3://{}/{}",
            written, self.bucket, key
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        debug!("Deleting s3://{}/{}", self.bucket, key);

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("Failed to delete {} from bucket {}", key, self.bucket))?;

        info!("Deleted s3://{}/{}", self.bucket, key);
        Ok(())
    }

    async fn presign(&self, key: &str, ttl: Duration) -> Result<String> {
        let config = PresigningConfig::expires_in(ttl)
            .map_err(|e| anyhow!("Invalid link lifetime {:?}: {}", ttl, e))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(config)
            .await
            .with_context(|| format!("Failed to presign {}", key))?;

        Ok(request.uri().to_string())
    }

    fn location(&self) -> String {
        format!("s3://{}", self.bucket)
    }
}

impl std::fmt::Debug for S3BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3BlobStore")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_rejects_invalid_credentials() {
        let credentials = Credentials::new("", "secret", "us-east-1", "bucket");
        let err = S3BlobStore::connect(&credentials).await.unwrap_err();
        assert!(err.to_string().contains("workstate configure"));
    }

    #[tokio::test]
    async fn test_location_and_debug() {
        let credentials = Credentials::new("AKIA", "secret", "us-east-1", "snapshots")
            .with_endpoint(Some("http://127.0.0.1:9000"));
        let store = S3BlobStore::connect(&credentials).await.unwrap();

        assert_eq!(store.location(), "s3://snapshots");
        assert_eq!(store.bucket(), "snapshots");

        let debug = format!("{:?}", store);
        assert!(debug.contains("snapshots"));
        assert!(!debug.contains("secret"));
    }
}

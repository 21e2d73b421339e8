//! Object storage abstraction.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::time::Duration;

/// An object stored in the bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

impl ObjectInfo {
    pub fn new(key: impl Into<String>, size: u64, last_modified: Option<DateTime<Utc>>) -> Self {
        Self {
            key: key.into(),
            size,
            last_modified,
        }
    }
}

/// Flat key-value object storage holding snapshot archives.
///
/// Retries, if any, belong to the implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Every object in the store.
    async fn list(&self) -> Result<Vec<ObjectInfo>>;

    /// Uploads the file at `local_path` under `key`, replacing any existing object.
    async fn put(&self, local_path: &Path, key: &str) -> Result<()>;

    /// Downloads `key` into `local_path`.
    async fn get(&self, key: &str, local_path: &Path) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Time-limited GET URL for `key`.
    async fn presign(&self, key: &str, ttl: Duration) -> Result<String>;

    /// Where objects live, e.g. `s3://bucket`.
    fn location(&self) -> String;
}

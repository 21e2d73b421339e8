//! Shared fixtures for workstate-remote integration tests.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use workstate_remote::{BlobStore, ObjectInfo};

/// In-memory object store keyed by object name.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, data: Vec<u8>) {
        self.objects.lock().unwrap().insert(key.to_string(), data);
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn list(&self) -> Result<Vec<ObjectInfo>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .map(|(key, data)| ObjectInfo::new(key.clone(), data.len() as u64, Some(Utc::now())))
            .collect())
    }

    async fn put(&self, local_path: &Path, key: &str) -> Result<()> {
        let data = std::fs::read(local_path)?;
        self.insert(key, data);
        Ok(())
    }

    async fn get(&self, key: &str, local_path: &Path) -> Result<()> {
        let data = self
            .object(key)
            .ok_or_else(|| anyhow!("NoSuchKey: {}", key))?;
        std::fs::write(local_path, data)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn presign(&self, key: &str, ttl: Duration) -> Result<String> {
        Ok(format!(
            "https://memory.invalid/{}?X-Amz-Expires={}",
            key,
            ttl.as_secs()
        ))
    }

    fn location(&self) -> String {
        "memory://snapshots".to_string()
    }
}

/// Writes `relative` below `base`, creating parent directories.
pub fn write_file(base: &Path, relative: &str, contents: &str) {
    let path = base.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

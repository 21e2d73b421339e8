//! Snapshot operations against a [`BlobStore`].
//!
//! Every temporary archive created here is owned by a drop guard, so it is
//! removed whether the operation succeeds, fails, or its future is dropped.

use crate::blob::{BlobStore, ObjectInfo};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use globset::Glob;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use workstate_core::{
    is_snapshot_key, resolve_conflict, ArchiveConfig, ArchiveSummary, Archiver, ExtractionReport,
    Extractor, FileSelector, SnapshotName,
};

/// Directory below the project root that receives download-only snapshots.
pub const DOWNLOADS_DIR: &str = "downloads";

/// Default lifetime of a shared link.
pub const DEFAULT_SHARE_HOURS: u64 = 24;

/// Longest lifetime a presigned link may have (seven days).
pub const MAX_SHARE_HOURS: u64 = 168;

/// Result of uploading a snapshot.
#[derive(Debug, Clone)]
pub struct SavedSnapshot {
    /// Object key the archive was stored under
    pub key: String,

    /// Archive statistics
    pub summary: ArchiveSummary,

    /// Entries left out because they could not be read
    pub skipped: usize,

    /// Whether a `.workstateignore` filtered the project
    pub ignore_file_found: bool,
}

/// A presigned download link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedLink {
    pub key: String,
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Snapshot workflows over an object store.
#[derive(Debug)]
pub struct SnapshotService<S> {
    store: S,
    archive_config: ArchiveConfig,
    show_progress: bool,
    temp_dir: Option<PathBuf>,
}

impl<S: BlobStore> SnapshotService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            archive_config: ArchiveConfig::default(),
            show_progress: false,
            temp_dir: None,
        }
    }

    pub fn with_archive_config(mut self, config: ArchiveConfig) -> Self {
        self.archive_config = config;
        self
    }

    /// Sets whether archive and extraction passes show progress bars.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Places temporary archives and restore scratch dirs in `dir` instead of
    /// the system temp dir. An archive config with its own temp dir wins.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Selects, archives and uploads `root` under `<label>.zip`.
    pub async fn save(&self, root: &Path, label: &str) -> Result<SavedSnapshot> {
        let name = SnapshotName::for_label(label)?;
        let root = root.to_path_buf();
        let mut config = self
            .archive_config
            .clone()
            .with_progress(self.show_progress);
        let inherit_temp_dir = config.temp_dir().is_none();
        if let (true, Some(dir)) = (inherit_temp_dir, &self.temp_dir) {
            config = config.with_temp_dir(dir.clone());
        }

        let (archive, skipped, ignore_file_found) = tokio::task::spawn_blocking(move || {
            let selection = FileSelector::new(&root).select()?;
            let archive = Archiver::new(config).archive(&selection)?;
            Ok::<_, workstate_core::Error>((
                archive,
                selection.skipped().len(),
                selection.ignore_file_found(),
            ))
        })
        .await
        .context("Archive task failed")??;

        self.store
            .put(archive.path(), name.as_str())
            .await
            .with_context(|| format!("Failed to upload snapshot {}", name))?;

        info!("Saved snapshot {} to {}", name, self.store.location());

        Ok(SavedSnapshot {
            key: name.into_string(),
            summary: archive.summary().clone(),
            skipped,
            ignore_file_found,
        })
    }

    /// Snapshot archives in the store, sorted by key.
    ///
    /// `filter` is a glob matched against the key (`client-*`).
    pub async fn list(&self, filter: Option<&str>) -> Result<Vec<ObjectInfo>> {
        let matcher = match filter {
            Some(pattern) => Some(
                Glob::new(pattern)
                    .with_context(|| format!("Invalid filter pattern '{}'", pattern))?
                    .compile_matcher(),
            ),
            None => None,
        };

        let mut snapshots: Vec<ObjectInfo> = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|object| is_snapshot_key(&object.key))
            .filter(|object| matcher.as_ref().map_or(true, |m| m.is_match(&object.key)))
            .collect();
        snapshots.sort_by(|a, b| a.key.cmp(&b.key));

        debug!("Found {} snapshots", snapshots.len());
        Ok(snapshots)
    }

    /// Downloads `key` and extracts it into `target` without overwriting.
    pub async fn restore(&self, key: &str, target: &Path) -> Result<ExtractionReport> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("workstate-");
        let scratch = match &self.temp_dir {
            Some(dir) => builder.tempdir_in(dir),
            None => builder.tempdir(),
        }
        .context("Failed to create temporary directory")?;
        let archive_path = scratch.path().join(local_file_name(key));

        self.store
            .get(key, &archive_path)
            .await
            .with_context(|| format!("Failed to download snapshot {}", key))?;

        let target = target.to_path_buf();
        let extractor = Extractor::new().with_progress(self.show_progress);
        let report = tokio::task::spawn_blocking(move || {
            let report = extractor.extract(&archive_path, &target);
            // Drop the scratch dir on the blocking thread once extraction ends
            drop(scratch);
            report
        })
        .await
        .context("Extraction task failed")??;

        info!("Restored {} ({} files)", key, report.file_count());
        Ok(report)
    }

    /// Downloads `key` into `dest_dir` without extracting it.
    ///
    /// An existing file of the same name is kept; the download gets a
    /// `name (1).zip` style name instead.
    pub async fn download(&self, key: &str, dest_dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dest_dir)
            .await
            .with_context(|| format!("Failed to create {}", dest_dir.display()))?;

        let temp = tempfile::Builder::new()
            .prefix(".workstate-download-")
            .tempfile_in(dest_dir)
            .with_context(|| format!("Failed to create temporary file in {}", dest_dir.display()))?
            .into_temp_path();

        self.store
            .get(key, &temp)
            .await
            .with_context(|| format!("Failed to download snapshot {}", key))?;

        let dest = resolve_conflict(&dest_dir.join(local_file_name(key)));
        temp.persist_noclobber(&dest)
            .map_err(|e| anyhow::anyhow!("Failed to save {}: {}", dest.display(), e.error))?;

        info!("Downloaded {} to {}", key, dest.display());
        Ok(dest)
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        self.store
            .delete(key)
            .await
            .with_context(|| format!("Failed to delete snapshot {}", key))?;
        info!("Deleted snapshot {}", key);
        Ok(())
    }

    /// Presigned GET link for `key`, valid for `hours`.
    pub async fn share(&self, key: &str, hours: u64) -> Result<SharedLink> {
        if hours == 0 || hours > MAX_SHARE_HOURS {
            bail!(
                "Link lifetime must be between 1 and {} hours, got {}",
                MAX_SHARE_HOURS,
                hours
            );
        }

        let ttl = Duration::from_secs(hours * 3600);
        let url = self
            .store
            .presign(key, ttl)
            .await
            .with_context(|| format!("Failed to generate a link for {}", key))?;
        let expires_at = Utc::now() + chrono::Duration::hours(hours as i64);

        Ok(SharedLink {
            key: key.to_string(),
            url,
            expires_at,
        })
    }
}

/// File name for a downloaded key, ignoring any `/` components in it.
fn local_file_name(key: &str) -> String {
    Path::new(key)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "snapshot.zip".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::MockBlobStore;
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/lib.rs"), "pub fn f() {}").unwrap();
        dir
    }

    fn service(store: MockBlobStore, scratch: &Path) -> SnapshotService<MockBlobStore> {
        SnapshotService::new(store).with_archive_config(ArchiveConfig::new().with_temp_dir(scratch))
    }

    #[tokio::test]
    async fn test_failed_upload_removes_temporary_archive() {
        let project = project();
        let scratch = TempDir::new().unwrap();
        let uploaded_from = Arc::new(Mutex::new(None));

        let mut store = MockBlobStore::new();
        let seen = Arc::clone(&uploaded_from);
        store.expect_put().times(1).returning(move |path, _| {
            assert!(path.exists());
            *seen.lock().unwrap() = Some(path.to_path_buf());
            Err(anyhow::anyhow!("connection reset"))
        });
        store
            .expect_location()
            .returning(|| "mock://bucket".to_string());

        let err = service(store, scratch.path())
            .save(project.path(), "demo")
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("connection reset"));
        let archive = uploaded_from.lock().unwrap().clone().unwrap();
        assert!(!archive.exists());
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_save_uses_label_as_key() {
        let project = project();
        let scratch = TempDir::new().unwrap();

        let mut store = MockBlobStore::new();
        store
            .expect_put()
            .withf(|_, key| key == "release-1.zip")
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_location()
            .returning(|| "mock://bucket".to_string());

        let saved = service(store, scratch.path())
            .save(project.path(), "release-1")
            .await
            .unwrap();

        assert_eq!(saved.key, "release-1.zip");
        assert_eq!(saved.summary.file_count, 2);
        assert!(!saved.ignore_file_found);
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_blank_label_never_touches_store() {
        let project = project();
        let scratch = TempDir::new().unwrap();

        let mut store = MockBlobStore::new();
        store.expect_put().never();

        let err = service(store, scratch.path())
            .save(project.path(), "   ")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<workstate_core::Error>(),
            Some(workstate_core::Error::InvalidLabel { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_filters_and_sorts() {
        let mut store = MockBlobStore::new();
        store.expect_list().returning(|| {
            Ok(vec![
                ObjectInfo::new("zeta.zip", 10, None),
                ObjectInfo::new("notes.txt", 3, None),
                ObjectInfo::new("alpha.zip", 20, None),
                ObjectInfo::new("client-a.zip", 5, None),
            ])
        });

        let service = SnapshotService::new(store);

        let keys: Vec<String> = service
            .list(None)
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.key)
            .collect();
        assert_eq!(keys, vec!["alpha.zip", "client-a.zip", "zeta.zip"]);

        let filtered = service.list(Some("client-*")).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].key, "client-a.zip");
    }

    #[tokio::test]
    async fn test_invalid_filter_is_an_error() {
        let store = MockBlobStore::new();
        assert!(SnapshotService::new(store).list(Some("[")).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_download_leaves_no_partial_file() {
        let dest = TempDir::new().unwrap();

        let mut store = MockBlobStore::new();
        store.expect_get().returning(|_, path| {
            fs::write(path, b"partial").unwrap();
            Err(anyhow::anyhow!("timed out"))
        });

        let result = SnapshotService::new(store)
            .download("demo.zip", dest.path())
            .await;
        assert!(result.is_err());
        assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_interrupted_restore_download_leaves_no_scratch() {
        let scratch = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        fs::write(target.path().join("main.rs"), "local").unwrap();

        let mut store = MockBlobStore::new();
        store.expect_get().times(1).returning(|_, path| {
            fs::write(path, b"PK\x03\x04partial").unwrap();
            Err(anyhow::anyhow!("connection reset"))
        });

        let err = SnapshotService::new(store)
            .with_temp_dir(scratch.path())
            .restore("demo.zip", target.path())
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("connection reset"));
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
        assert_eq!(fs::read_dir(target.path()).unwrap().count(), 1);
        assert_eq!(fs::read_to_string(target.path().join("main.rs")).unwrap(), "local");
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_restore_leaves_no_scratch() {
        let scratch = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        fs::write(target.path().join("main.rs"), "local").unwrap();

        let mut store = MockBlobStore::new();
        store.expect_get().times(1).returning(|_, path| {
            fs::write(path, b"this is not a zip archive").unwrap();
            Ok(())
        });

        let err = SnapshotService::new(store)
            .with_temp_dir(scratch.path())
            .restore("demo.zip", target.path())
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<workstate_core::Error>(),
            Some(workstate_core::Error::CorruptArchive { .. })
        ));
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
        assert_eq!(fs::read_dir(target.path()).unwrap().count(), 1);
        assert_eq!(fs::read_to_string(target.path().join("main.rs")).unwrap(), "local");
    }

    #[tokio::test]
    async fn test_service_temp_dir_holds_save_archive() {
        let project = project();
        let scratch = TempDir::new().unwrap();
        let scratch_path = scratch.path().to_path_buf();

        let mut store = MockBlobStore::new();
        store.expect_put().times(1).returning(move |path, _| {
            assert_eq!(path.parent(), Some(scratch_path.as_path()));
            Ok(())
        });
        store
            .expect_location()
            .returning(|| "mock://bucket".to_string());

        SnapshotService::new(store)
            .with_temp_dir(scratch.path())
            .save(project.path(), "demo")
            .await
            .unwrap();
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_share_computes_expiry() {
        let mut store = MockBlobStore::new();
        store
            .expect_presign()
            .withf(|key, ttl| key == "demo.zip" && *ttl == Duration::from_secs(2 * 3600))
            .returning(|_, _| Ok("https://example.com/demo.zip?sig=1".to_string()));

        let before = Utc::now();
        let link = SnapshotService::new(store).share("demo.zip", 2).await.unwrap();

        assert_eq!(link.url, "https://example.com/demo.zip?sig=1");
        assert!(link.expires_at >= before + chrono::Duration::hours(2));
        assert!(link.expires_at <= Utc::now() + chrono::Duration::hours(2));
    }

    #[tokio::test]
    async fn test_share_rejects_out_of_range_lifetimes() {
        let mut store = MockBlobStore::new();
        store.expect_presign().never();
        let service = SnapshotService::new(store);

        assert!(service.share("demo.zip", 0).await.is_err());
        assert!(service.share("demo.zip", MAX_SHARE_HOURS + 1).await.is_err());
    }

    #[test]
    fn test_local_file_name() {
        assert_eq!(local_file_name("demo.zip"), "demo.zip");
        assert_eq!(local_file_name("team/demo.zip"), "demo.zip");
        assert_eq!(local_file_name("../../demo.zip"), "demo.zip");
    }
}

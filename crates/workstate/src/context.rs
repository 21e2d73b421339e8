//! Per-invocation settings shared by all commands

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use workstate_remote::{
    default_config_path, CredentialStore, FileCredentialStore, S3BlobStore, SnapshotService,
};

use crate::cli::Cli;

/// Resolved global options.
#[derive(Debug, Clone)]
pub struct Context {
    root: PathBuf,
    config_path: PathBuf,
    show_progress: bool,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config_path = match &cli.config {
            Some(path) => path.clone().into_std_path_buf(),
            None => default_config_path()?,
        };

        Ok(Self {
            root: cli.dir.clone().into_std_path_buf(),
            config_path,
            show_progress: !cli.quiet,
        })
    }

    /// Project directory the command works on.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn show_progress(&self) -> bool {
        self.show_progress
    }

    pub fn credential_store(&self) -> FileCredentialStore {
        FileCredentialStore::new(&self.config_path)
    }

    /// Snapshot service backed by the configured bucket.
    pub async fn snapshot_service(&self) -> Result<SnapshotService<S3BlobStore>> {
        let store = self.credential_store();
        let credentials = store.load()?.ok_or_else(|| {
            anyhow!(
                "No credentials found in {}. Run `workstate configure` first",
                store.location()
            )
        })?;

        let blob_store = S3BlobStore::connect(&credentials).await?;
        Ok(SnapshotService::new(blob_store).with_progress(self.show_progress))
    }
}

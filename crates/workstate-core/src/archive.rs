//! Snapshot archive creation.
//!
//! Selected files are streamed, in selection order, into a ZIP container with
//! DEFLATE compression. Entry names are root-relative with `/` separators so
//! any standard unzip tool can restore them.
//!
//! The archive is written to a uniquely named temporary file that is deleted
//! when the returned [`SnapshotArchive`] is dropped, and immediately when any
//! entry fails to write.

use crate::error::{Error, Result};
use crate::progress::EntryProgress;
use crate::selector::Selection;
use chrono::{Datelike, Timelike};
use sha2::{Digest, Sha256};
use std::fs::{File, Metadata};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};
use tempfile::TempPath;
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Default compression level (6 = balanced speed/ratio).
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Configuration for archive creation.
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    compression_level: u32,
    show_progress: bool,
    temp_dir: Option<PathBuf>,
}

impl ArchiveConfig {
    pub fn new() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            show_progress: false,
            temp_dir: None,
        }
    }

    /// Sets the compression level, clamped to 1-9.
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.clamp(1, 9);
        self
    }

    /// Sets whether to show progress.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Places the temporary archive in `dir`.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Compression level, always within 1-9.
    pub fn compression_level(&self) -> u32 {
        self.compression_level
    }

    pub fn show_progress(&self) -> bool {
        self.show_progress
    }

    /// Directory for the temporary archive; `None` means the system temp dir.
    pub fn temp_dir(&self) -> Option<&Path> {
        self.temp_dir.as_deref()
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about a created archive.
#[derive(Debug, Clone)]
pub struct ArchiveSummary {
    /// Number of file entries written
    pub file_count: usize,

    /// Uncompressed bytes read from the project
    pub source_bytes: u64,

    /// Size of the archive on disk
    pub archive_bytes: u64,

    /// SHA256 checksum of the archive
    pub checksum: String,

    /// Duration of the operation in seconds
    pub duration_seconds: f64,
}

impl ArchiveSummary {
    /// Compression ratio (archive / source).
    pub fn compression_ratio(&self) -> f64 {
        if self.source_bytes > 0 {
            self.archive_bytes as f64 / self.source_bytes as f64
        } else {
            0.0
        }
    }

    /// Percentage of bytes saved by compression.
    pub fn compression_percentage(&self) -> u8 {
        ((1.0 - self.compression_ratio()).clamp(0.0, 1.0) * 100.0) as u8
    }
}

/// A temporary archive owned by the caller.
///
/// Dropping it deletes the file.
#[derive(Debug)]
pub struct SnapshotArchive {
    path: TempPath,
    summary: ArchiveSummary,
}

impl SnapshotArchive {
    /// Location of the archive on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn summary(&self) -> &ArchiveSummary {
        &self.summary
    }

    /// Deletes the archive, reporting any failure.
    pub fn delete(self) -> io::Result<()> {
        self.path.close()
    }

    /// Moves the archive to `dest`, keeping it past drop.
    pub fn persist(self, dest: &Path) -> Result<PathBuf> {
        match self.path.persist(dest) {
            Ok(()) => Ok(dest.to_path_buf()),
            Err(e) => {
                // Rename fails across filesystems; copy instead. The temporary
                // file is still removed when `e.path` drops.
                debug!("Rename failed ({}), copying archive instead", e.error);
                std::fs::copy(&e.path, dest).map_err(|err| Error::filesystem(dest, err))?;
                Ok(dest.to_path_buf())
            }
        }
    }
}

/// Writes selections into snapshot archives.
#[derive(Debug, Clone, Default)]
pub struct Archiver {
    config: ArchiveConfig,
}

impl Archiver {
    pub fn new(config: ArchiveConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Archives every file of the selection into a new temporary ZIP file.
    ///
    /// Fails with [`Error::ArchiveWrite`] if any selected file can no longer
    /// be read; the partial archive is removed before the error is returned.
    pub fn archive(&self, selection: &Selection) -> Result<SnapshotArchive> {
        let start_time = Instant::now();

        let mut builder = tempfile::Builder::new();
        builder.prefix("workstate-").suffix(".zip");
        let temp = match &self.config.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| {
            let dir = self
                .config
                .temp_dir
                .clone()
                .unwrap_or_else(std::env::temp_dir);
            Error::archive_write(dir, e)
        })?;

        let (file, path) = temp.into_parts();
        debug!("Writing archive to {}", path.display());

        let progress = EntryProgress::new(self.config.show_progress);
        progress.start(selection.len() as u64, "Archiving");

        let source_bytes = match self.write_entries(file, selection, &progress) {
            Ok(bytes) => bytes,
            Err(e) => {
                progress.abandon();
                warn!("Archive failed, removing {}", path.display());
                // Dropping `path` deletes the incomplete archive.
                drop(path);
                return Err(e);
            }
        };
        progress.finish();

        let archive_bytes = std::fs::metadata(&path)
            .map_err(|e| Error::filesystem(&path, e))?
            .len();
        let checksum = calculate_checksum(&path)?;

        let summary = ArchiveSummary {
            file_count: selection.len(),
            source_bytes,
            archive_bytes,
            checksum,
            duration_seconds: start_time.elapsed().as_secs_f64(),
        };

        info!(
            "Archived {} files ({} bytes -> {} bytes)",
            summary.file_count, summary.source_bytes, summary.archive_bytes
        );

        Ok(SnapshotArchive { path, summary })
    }

    fn write_entries(
        &self,
        file: File,
        selection: &Selection,
        progress: &EntryProgress,
    ) -> Result<u64> {
        let mut zip = ZipWriter::new(BufWriter::new(file));
        let mut total = 0u64;

        for entry in selection {
            let mut source =
                File::open(&entry.path).map_err(|e| Error::archive_write(&entry.relative_path, e))?;
            let metadata = source
                .metadata()
                .map_err(|e| Error::archive_write(&entry.relative_path, e))?;

            zip.start_file(entry.entry_name(), self.entry_options(&metadata))
                .map_err(|e| Error::archive_write(&entry.relative_path, e))?;

            let copied = io::copy(&mut source, &mut zip)
                .map_err(|e| Error::archive_write(&entry.relative_path, e))?;

            debug!("Added {} ({} bytes)", entry.relative_path.display(), copied);
            total += copied;
            progress.inc();
        }

        let writer = zip
            .finish()
            .map_err(|e| Error::archive_write(selection.root(), e))?;
        writer
            .into_inner()
            .map_err(|e| Error::archive_write(selection.root(), e.error()))?;

        Ok(total)
    }

    fn entry_options(&self, metadata: &Metadata) -> SimpleFileOptions {
        let modified = metadata
            .modified()
            .ok()
            .and_then(zip_timestamp)
            .unwrap_or_default();

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(self.config.compression_level as i64))
            .last_modified_time(modified)
            .large_file(metadata.len() >= u32::MAX as u64);

        #[cfg(unix)]
        let options = {
            use std::os::unix::fs::PermissionsExt;
            options.unix_permissions(metadata.permissions().mode() & 0o777)
        };

        options
    }
}

/// Converts a file time to a ZIP (DOS, local time) timestamp.
///
/// Times outside the 1980-2107 range have no ZIP representation.
fn zip_timestamp(time: SystemTime) -> Option<zip::DateTime> {
    let local: chrono::DateTime<chrono::Local> = time.into();
    let year = u16::try_from(local.year()).ok()?;

    zip::DateTime::from_date_and_time(
        year,
        local.month() as u8,
        local.day() as u8,
        local.hour() as u8,
        local.minute() as u8,
        local.second() as u8,
    )
    .ok()
}

/// Calculates the SHA256 checksum of a file.
pub fn calculate_checksum(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| Error::filesystem(path, e))?;

    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|e| Error::filesystem(path, e))?;

    Ok(format!("{:x}", hasher.finalize()))
}

/// Archives `selection` with the default configuration.
pub fn archive(selection: &Selection) -> Result<SnapshotArchive> {
    Archiver::default().archive(selection)
}

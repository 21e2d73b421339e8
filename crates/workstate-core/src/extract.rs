//! Snapshot extraction.
//!
//! Unpacks a snapshot archive into a target directory without ever replacing
//! existing data: when a destination file already exists the entry is written
//! next to it as `name (1).ext`, `name (2).ext`, ... using the first free
//! name. Extraction is not transactional; files written before a failure stay
//! in place.

use crate::error::{Error, Result};
use crate::progress::EntryProgress;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// An entry written under a disambiguated name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamedEntry {
    /// Entry path inside the archive
    pub entry: PathBuf,

    /// Path actually written, relative to the target directory
    pub written_to: PathBuf,
}

/// Outcome of an extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Files written, relative to the target directory
    pub extracted: Vec<PathBuf>,

    /// Files that collided with existing ones
    pub renamed: Vec<RenamedEntry>,

    /// Directory entries created (or already present)
    pub directories: usize,

    /// Entries skipped because their names escape the target directory
    pub unsafe_entries: Vec<String>,
}

impl ExtractionReport {
    pub fn file_count(&self) -> usize {
        self.extracted.len()
    }
}

/// Extracts snapshot archives.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    show_progress: bool,
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to show progress.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Extracts every entry of `archive_path` below `target`.
    ///
    /// Fails with [`Error::CorruptArchive`] when the archive cannot be opened
    /// or an entry cannot be decoded, and with [`Error::Extraction`] when the
    /// target cannot be created or written.
    pub fn extract(&self, archive_path: &Path, target: &Path) -> Result<ExtractionReport> {
        let file =
            File::open(archive_path).map_err(|e| Error::corrupt_archive(archive_path, e))?;
        let mut zip = ZipArchive::new(BufReader::new(file))
            .map_err(|e| Error::corrupt_archive(archive_path, e))?;

        fs::create_dir_all(target).map_err(|e| Error::extraction(target, e))?;

        let progress = EntryProgress::new(self.show_progress);
        progress.start(zip.len() as u64, "Extracting");

        let mut report = ExtractionReport::default();
        for idx in 0..zip.len() {
            let mut entry = zip
                .by_index(idx)
                .map_err(|e| Error::corrupt_archive(archive_path, e))?;
            progress.inc();

            let Some(relative) = entry.enclosed_name() else {
                warn!("Skipping unsafe archive entry: {}", entry.name());
                report.unsafe_entries.push(entry.name().to_string());
                continue;
            };
            let dest = target.join(&relative);

            if entry.is_dir() {
                fs::create_dir_all(&dest).map_err(|e| Error::extraction(&dest, e))?;
                report.directories += 1;
                continue;
            }

            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::extraction(parent, e))?;
            }

            let final_path = resolve_conflict(&dest);
            if final_path != dest {
                warn!(
                    "{} already exists, extracting to {}",
                    dest.display(),
                    final_path.display()
                );
                report.renamed.push(RenamedEntry {
                    entry: relative.clone(),
                    written_to: final_path
                        .strip_prefix(target)
                        .unwrap_or(&final_path)
                        .to_path_buf(),
                });
            }

            let mut out = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&final_path)
                .map_err(|e| Error::extraction(&final_path, e))?;

            if let Err(e) = copy_entry(&mut entry, &mut out, archive_path, &final_path) {
                drop(out);
                let _ = fs::remove_file(&final_path);
                progress.abandon();
                return Err(e);
            }

            restore_metadata(&out, &final_path, entry.last_modified(), entry.unix_mode());
            debug!("Extracted {}", final_path.display());
            report.extracted.push(
                final_path
                    .strip_prefix(target)
                    .unwrap_or(&final_path)
                    .to_path_buf(),
            );
        }
        progress.finish();

        info!(
            "Extracted {} files into {} ({} renamed)",
            report.extracted.len(),
            target.display(),
            report.renamed.len()
        );

        Ok(report)
    }
}

/// Extracts `archive_path` into `target` with default settings.
pub fn extract(archive_path: &Path, target: &Path) -> Result<ExtractionReport> {
    Extractor::new().extract(archive_path, target)
}

/// Returns `path` if nothing exists there, otherwise the first free
/// `stem (n).ext` sibling, counting from 1.
pub fn resolve_conflict(path: &Path) -> PathBuf {
    if !occupied(path) {
        return path.to_path_buf();
    }

    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    let mut counter: u64 = 1;
    loop {
        let name = match &extension {
            Some(ext) => format!("{} ({}).{}", stem, counter, ext),
            None => format!("{} ({})", stem, counter),
        };
        let candidate = parent.join(name);
        if !occupied(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Whether anything, including a dangling symlink, exists at `path`.
fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Copies entry data, separating decode failures from write failures.
fn copy_entry(
    reader: &mut impl Read,
    writer: &mut impl Write,
    archive_path: &Path,
    dest: &Path,
) -> Result<u64> {
    let mut buf = vec![0u8; 64 * 1024];
    let mut total = 0u64;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::corrupt_archive(archive_path, e)),
        };
        writer
            .write_all(&buf[..n])
            .map_err(|e| Error::extraction(dest, e))?;
        total += n as u64;
    }

    writer.flush().map_err(|e| Error::extraction(dest, e))?;
    Ok(total)
}

/// Applies the entry's modification time and permission bits. Best effort.
fn restore_metadata(
    out: &File,
    dest: &Path,
    last_modified: Option<zip::DateTime>,
    unix_mode: Option<u32>,
) {
    if let Some(modified) = last_modified.and_then(system_time) {
        if let Err(e) = out.set_modified(modified) {
            debug!("Could not set mtime on {}: {}", dest.display(), e);
        }
    }

    #[cfg(unix)]
    if let Some(mode) = unix_mode {
        use std::os::unix::fs::PermissionsExt;
        let permissions = fs::Permissions::from_mode(mode & 0o777);
        if let Err(e) = fs::set_permissions(dest, permissions) {
            debug!("Could not set permissions on {}: {}", dest.display(), e);
        }
    }
    #[cfg(not(unix))]
    let _ = unix_mode;
}

fn system_time(time: zip::DateTime) -> Option<std::time::SystemTime> {
    let local = chrono::NaiveDate::from_ymd_opt(
        i32::from(time.year()),
        u32::from(time.month()),
        u32::from(time.day()),
    )?
    .and_hms_opt(
        u32::from(time.hour()),
        u32::from(time.minute()),
        u32::from(time.second()),
    )?
    .and_local_timezone(chrono::Local)
    .single()?;

    Some(local.into())
}

//! Project file selection.
//!
//! Walks the project tree in file-name order, prunes ignored directories and
//! collects the regular files that pass the ignore rules. Symbolic links are
//! never followed. Entries that cannot be read are skipped with a warning and
//! recorded in the [`Selection`]; only an unreadable root aborts the pass.

use crate::error::{Error, Result};
use crate::rules::{IgnoreRules, IGNORE_FILE};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// One filesystem entry under the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile {
    /// Absolute (or root-joined) path on disk
    pub path: PathBuf,

    /// Path relative to the project root
    pub relative_path: PathBuf,

    /// Whether the entry is a directory
    pub is_dir: bool,

    /// Size in bytes (0 for directories)
    pub size: u64,
}

impl ProjectFile {
    /// Archive entry name: the relative path with `/` separators.
    pub fn entry_name(&self) -> String {
        self.relative_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// An entry left out of the selection for a reason other than the ignore rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: String,
}

/// Files chosen for a snapshot, in traversal order.
#[derive(Debug, Clone)]
pub struct Selection {
    root: PathBuf,
    files: Vec<ProjectFile>,
    skipped: Vec<SkippedEntry>,
    ignore_file_found: bool,
}

impl Selection {
    /// Project root the selection was taken from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Selected files in traversal order.
    pub fn files(&self) -> &[ProjectFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProjectFile> {
        self.files.iter()
    }

    /// Sum of the selected file sizes.
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// Entries skipped because they could not be read or represented.
    pub fn skipped(&self) -> &[SkippedEntry] {
        &self.skipped
    }

    /// Whether an ignore file filtered this selection.
    pub fn ignore_file_found(&self) -> bool {
        self.ignore_file_found
    }
}

impl<'a> IntoIterator for &'a Selection {
    type Item = &'a ProjectFile;
    type IntoIter = std::slice::Iter<'a, ProjectFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

/// Selects the files of a project that belong in a snapshot.
#[derive(Debug, Clone)]
pub struct FileSelector {
    root: PathBuf,
}

impl FileSelector {
    /// Creates a selector for a project root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Loads the ignore file and walks the project.
    pub fn select(&self) -> Result<Selection> {
        // Read the root first so an unreadable project fails instead of
        // producing an empty selection.
        std::fs::read_dir(&self.root).map_err(|e| Error::filesystem(&self.root, e))?;

        let rules = IgnoreRules::load(&self.root)?;
        if !rules.has_ignore_file() {
            warn!(
                "No {} file found in {}. All files will be selected.",
                IGNORE_FILE,
                self.root.display()
            );
        }

        self.select_with(&rules)
    }

    /// Walks the project using an already compiled rule set.
    pub fn select_with(&self, rules: &IgnoreRules) -> Result<Selection> {
        let mut files = Vec::new();
        let mut skipped = Vec::new();

        let mut walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .min_depth(1)
            .into_iter();

        while let Some(next) = walker.next() {
            let entry = match next {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(self.root.as_path()).to_path_buf();
                    if e.depth() == 0 {
                        let io = e
                            .into_io_error()
                            .unwrap_or_else(|| std::io::Error::other("walk failed"));
                        return Err(Error::filesystem(&self.root, io));
                    }
                    warn!("Skipping unreadable entry {}: {}", path.display(), e);
                    skipped.push(SkippedEntry {
                        path,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let relative = match entry.path().strip_prefix(&self.root) {
                Ok(relative) => relative.to_path_buf(),
                Err(_) => continue,
            };
            let file_type = entry.file_type();
            let is_dir = file_type.is_dir();

            if rules.is_ignored(&relative, is_dir) {
                debug!("Ignored: {}", relative.display());
                if is_dir {
                    walker.skip_current_dir();
                }
                continue;
            }

            if is_dir {
                continue;
            }

            if !file_type.is_file() {
                debug!("Not following link: {}", relative.display());
                skipped.push(SkippedEntry {
                    path: relative,
                    reason: "not a regular file".to_string(),
                });
                continue;
            }

            if relative.to_str().is_none() {
                warn!("Skipping non UTF-8 path: {}", relative.display());
                skipped.push(SkippedEntry {
                    path: relative,
                    reason: "path is not valid UTF-8".to_string(),
                });
                continue;
            }

            let size = match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(e) => {
                    warn!("Skipping {}: {}", relative.display(), e);
                    skipped.push(SkippedEntry {
                        path: relative,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if let Err(e) = File::open(entry.path()) {
                warn!("Skipping unreadable file {}: {}", relative.display(), e);
                skipped.push(SkippedEntry {
                    path: relative,
                    reason: e.to_string(),
                });
                continue;
            }

            files.push(ProjectFile {
                path: entry.path().to_path_buf(),
                relative_path: relative,
                is_dir: false,
                size,
            });
        }

        info!(
            "Selected {} files from {} ({} skipped)",
            files.len(),
            self.root.display(),
            skipped.len()
        );

        Ok(Selection {
            root: self.root.clone(),
            files,
            skipped,
            ignore_file_found: rules.has_ignore_file(),
        })
    }
}

/// Selects the snapshot files under `root`.
pub fn select(root: &Path) -> Result<Selection> {
    FileSelector::new(root).select()
}

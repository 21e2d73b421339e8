//! Snapshot names.

use crate::error::{Error, Result};
use std::fmt;

/// Extension appended to every snapshot name.
pub const ARCHIVE_EXTENSION: &str = ".zip";

/// Canonical name of a stored snapshot: the label plus [`ARCHIVE_EXTENSION`].
///
/// The label is taken as given; characters the remote store rejects are the
/// caller's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotName(String);

impl SnapshotName {
    /// Derives the snapshot name for a label.
    pub fn for_label(label: &str) -> Result<Self> {
        if label.trim().is_empty() {
            return Err(Error::invalid_label(label));
        }
        Ok(Self(format!("{}{}", label, ARCHIVE_EXTENSION)))
    }

    /// Label with a local `-YYYYMMDD-HHMMSS` suffix, for unique names.
    pub fn timestamped_label(label: &str) -> String {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        format!("{}-{}", label, timestamp)
    }

    /// The name as a storage key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the name, returning the key.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SnapshotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SnapshotName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Returns true if a storage key names a snapshot archive.
pub fn is_snapshot_key(key: &str) -> bool {
    key.ends_with(ARCHIVE_EXTENSION)
}

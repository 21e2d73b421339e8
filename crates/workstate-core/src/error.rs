//! Error types for workstate-core

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias using workstate-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while selecting, archiving or extracting project files
#[derive(Error, Debug)]
pub enum Error {
    /// Project root (or another required path) cannot be read
    #[error("Cannot read {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed ignore rule
    #[error("Invalid ignore rule on line {line} (`{rule}`): {message}")]
    PatternSyntax {
        line: usize,
        rule: String,
        message: String,
    },

    /// Archive could not be written
    #[error("Failed to write archive entry {}: {reason}", path.display())]
    ArchiveWrite { path: PathBuf, reason: String },

    /// Archive could not be opened or parsed
    #[error("Corrupt or unreadable archive {}: {reason}", path.display())]
    CorruptArchive { path: PathBuf, reason: String },

    /// Extraction target could not be created or written
    #[error("Failed to extract to {}: {reason}", path.display())]
    Extraction { path: PathBuf, reason: String },

    /// Snapshot label is empty or blank
    #[error("Invalid snapshot label {label:?}: label must not be empty or blank")]
    InvalidLabel { label: String },

    /// Unknown ignore template
    #[error("Unknown tool '{name}'. Valid options: {valid}")]
    UnknownTool { name: String, valid: String },
}

impl Error {
    /// Create a filesystem error for a path
    pub fn filesystem(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create an archive write error
    pub fn archive_write(path: impl AsRef<Path>, reason: impl ToString) -> Self {
        Self::ArchiveWrite {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Create a corrupt archive error
    pub fn corrupt_archive(path: impl AsRef<Path>, reason: impl ToString) -> Self {
        Self::CorruptArchive {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Create an extraction error
    pub fn extraction(path: impl AsRef<Path>, reason: impl ToString) -> Self {
        Self::Extraction {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid label error
    pub fn invalid_label(label: impl Into<String>) -> Self {
        Self::InvalidLabel {
            label: label.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_path() {
        let err = Error::archive_write("src/main.rs", "file vanished");
        assert_eq!(
            err.to_string(),
            "Failed to write archive entry src/main.rs: file vanished"
        );

        let err = Error::corrupt_archive("/tmp/x.zip", "invalid Zip archive");
        assert!(err.to_string().contains("/tmp/x.zip"));
    }

    #[test]
    fn test_filesystem_error_keeps_source() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::filesystem("/root/project", io);
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("Cannot read /root/project"));
    }
}

//! Workstate Core
//!
//! Local half of workstate: decides which project files belong in a snapshot,
//! packs them into a ZIP archive and unpacks archives back into a directory
//! without overwriting anything that is already there.
//!
//! # Features
//!
//! - **Ignore rules**: `.workstateignore` with gitignore syntax (globs,
//!   anchoring, directory-only rules, negation, last match wins)
//! - **Deterministic selection**: file-name ordered walk, ignored directories
//!   pruned, symbolic links never followed
//! - **Deflate archives**: relative entry names, timestamps and Unix
//!   permissions preserved, SHA-256 checksum of the result
//! - **Safe extraction**: existing files are kept and incoming copies are
//!   written as `name (1).ext`, entries escaping the target are skipped
//! - **Templates**: starter ignore files for common toolchains
//!
//! # Examples
//!
//! ```no_run
//! use std::path::Path;
//! use workstate_core::{extract, select, Archiver, ArchiveConfig};
//!
//! fn main() -> workstate_core::Result<()> {
//!     let selection = select(Path::new("."))?;
//!     let archive = Archiver::new(ArchiveConfig::new()).archive(&selection)?;
//!
//!     println!(
//!         "{} files, {} bytes",
//!         archive.summary().file_count,
//!         archive.summary().archive_bytes
//!     );
//!
//!     extract(archive.path(), Path::new("restored"))?;
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod error;
pub mod extract;
pub mod naming;
pub mod progress;
pub mod rules;
pub mod selector;
pub mod size;
pub mod templates;

// Re-export commonly used types
pub use archive::{
    archive, calculate_checksum, ArchiveConfig, ArchiveSummary, Archiver, SnapshotArchive,
    DEFAULT_COMPRESSION_LEVEL,
};
pub use error::{Error, Result};
pub use extract::{extract, resolve_conflict, ExtractionReport, Extractor, RenamedEntry};
pub use naming::{is_snapshot_key, SnapshotName, ARCHIVE_EXTENSION};
pub use progress::EntryProgress;
pub use rules::{IgnoreRules, RejectedRule, IGNORE_FILE};
pub use selector::{select, FileSelector, ProjectFile, Selection, SkippedEntry};
pub use size::format_size;
pub use templates::{write_ignore_file, CodeTool};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

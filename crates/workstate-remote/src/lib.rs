//! Workstate Remote
//!
//! Remote half of workstate: where credentials are kept, how snapshots reach
//! object storage, and the save / list / restore / share workflows built on
//! top of [`workstate_core`].
//!
//! - [`CredentialStore`] / [`FileCredentialStore`]: JSON config file with the
//!   access keys and bucket
//! - [`BlobStore`] / [`S3BlobStore`]: object storage, AWS S3 or any
//!   S3-compatible endpoint
//! - [`SnapshotService`]: snapshot workflows with guaranteed cleanup of
//!   temporary archives
//! - [`shared`]: downloads of presigned links

pub mod blob;
pub mod credentials;
pub mod s3;
pub mod shared;
pub mod snapshot;

pub use blob::{BlobStore, ObjectInfo};
pub use credentials::{
    default_config_path, home_dir, CredentialStore, Credentials, CredentialsError,
    FileCredentialStore,
};
pub use s3::S3BlobStore;
pub use shared::{download_shared, file_name_from_url, parse_shared_url, SHARED_FALLBACK_NAME};
pub use snapshot::{
    SavedSnapshot, SharedLink, SnapshotService, DEFAULT_SHARE_HOURS, DOWNLOADS_DIR,
    MAX_SHARE_HOURS,
};

//! Object-storage credentials and their on-disk store.
//!
//! Credentials live in a JSON file under the top-level `aws` key. Other
//! top-level keys belong to whoever wrote them and survive a save.

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Top-level key holding the credentials in the config file.
pub const CREDENTIALS_KEY: &str = "aws";

/// Config directory below the home directory.
pub const CONFIG_DIR: &str = ".workstate";

/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.json";

pub const ACCESS_KEY_ID: &str = "access_key_id";
pub const SECRET_ACCESS_KEY: &str = "secret_access_key";
pub const REGION: &str = "region";
pub const BUCKET_NAME: &str = "bucket_name";

/// Access keys and target bucket.
///
/// The secret key is wiped from memory on drop and never printed.
// Defaults are per field: a container-level default would move fields out of
// a `Drop` value.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    #[zeroize(skip)]
    #[serde(default)]
    pub access_key_id: String,

    #[serde(default)]
    pub secret_access_key: String,

    #[zeroize(skip)]
    #[serde(default)]
    pub region: String,

    #[zeroize(skip)]
    #[serde(default)]
    pub bucket_name: String,

    /// Endpoint of an S3-compatible service (MinIO, Wasabi, ...)
    #[zeroize(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// A reason credentials cannot be used.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialsError {
    /// One or more required fields are empty or blank
    #[error("Missing or blank credential fields: {}", .fields.join(", "))]
    MissingFields { fields: Vec<&'static str> },

    /// Region does not look like an AWS region
    #[error("'{region}' is not a valid region (expected something like us-east-1)")]
    InvalidRegion { region: String },
}

static REGION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z]{2}(-gov|-iso[a-z]?)?-[a-z]+-\d+$").expect("region regex is valid")
});

impl Credentials {
    /// Builds credentials from raw input, trimming every field.
    pub fn new(
        access_key_id: impl AsRef<str>,
        secret_access_key: impl AsRef<str>,
        region: impl AsRef<str>,
        bucket_name: impl AsRef<str>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.as_ref().trim().to_string(),
            secret_access_key: secret_access_key.as_ref().trim().to_string(),
            region: region.as_ref().trim().to_string(),
            bucket_name: bucket_name.as_ref().trim().to_string(),
            endpoint: None,
        }
    }

    /// Sets an S3-compatible endpoint; blank values clear it.
    pub fn with_endpoint(mut self, endpoint: Option<impl AsRef<str>>) -> Self {
        self.endpoint = endpoint
            .map(|e| e.as_ref().trim().to_string())
            .filter(|e| !e.is_empty());
        self
    }

    /// Every problem with these credentials, in field order.
    pub fn problems(&self) -> Vec<CredentialsError> {
        let mut problems = Vec::new();

        let missing: Vec<&'static str> = [
            (ACCESS_KEY_ID, &self.access_key_id),
            (SECRET_ACCESS_KEY, &self.secret_access_key),
            (REGION, &self.region),
            (BUCKET_NAME, &self.bucket_name),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if !missing.is_empty() {
            problems.push(CredentialsError::MissingFields { fields: missing });
        }

        let region = self.region.trim();
        if !region.is_empty() && !REGION_RE.is_match(region) {
            problems.push(CredentialsError::InvalidRegion {
                region: region.to_string(),
            });
        }

        problems
    }

    /// Fails with the first problem found.
    pub fn validate(&self) -> std::result::Result<(), CredentialsError> {
        match self.problems().into_iter().next() {
            Some(problem) => Err(problem),
            None => Ok(()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.problems().is_empty()
    }

    /// Access key with everything after the first three characters hidden.
    pub fn masked_access_key(&self) -> String {
        mask(&self.access_key_id)
    }

    /// Secret key with everything after the first three characters hidden.
    pub fn masked_secret_key(&self) -> String {
        mask(&self.secret_access_key)
    }
}

fn mask(value: &str) -> String {
    let visible: String = value.chars().take(3).collect();
    format!("{}***", visible)
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.masked_access_key())
            .field("secret_access_key", &"[REDACTED]")
            .field("region", &self.region)
            .field("bucket_name", &self.bucket_name)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Persistence for [`Credentials`].
pub trait CredentialStore: Send + Sync {
    /// Stored credentials, or `None` when nothing has been configured.
    fn load(&self) -> Result<Option<Credentials>>;

    /// Replaces the stored credentials.
    fn save(&self, credentials: &Credentials) -> Result<()>;

    /// Human-readable location of the store.
    fn location(&self) -> String;
}

/// Credentials kept in a JSON config file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `$HOME/.workstate/config.json`.
    pub fn at_default_location() -> Result<Self> {
        Ok(Self::new(default_config_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last modification time of the config file, if it exists.
    pub fn modified(&self) -> Option<chrono::DateTime<chrono::Local>> {
        std::fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .ok()
            .map(chrono::DateTime::from)
    }

    fn read_document(&self) -> Result<Option<serde_json::Map<String, serde_json::Value>>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read config file {}", self.path.display())
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(Some(serde_json::Map::new()));
        }

        let value: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", self.path.display()))?;

        match value {
            serde_json::Value::Object(map) => Ok(Some(map)),
            _ => Err(anyhow!(
                "Config file {} does not contain a JSON object",
                self.path.display()
            )),
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credentials>> {
        let Some(mut document) = self.read_document()? else {
            debug!("No config file at {}", self.path.display());
            return Ok(None);
        };

        match document.remove(CREDENTIALS_KEY) {
            Some(value) => {
                let credentials: Credentials = serde_json::from_value(value).with_context(|| {
                    format!(
                        "Invalid '{}' section in {}",
                        CREDENTIALS_KEY,
                        self.path.display()
                    )
                })?;
                Ok(Some(credentials))
            }
            None => Ok(None),
        }
    }

    fn save(&self, credentials: &Credentials) -> Result<()> {
        let mut document = self.read_document()?.unwrap_or_default();
        document.insert(
            CREDENTIALS_KEY.to_string(),
            serde_json::to_value(credentials).context("Failed to serialize credentials")?,
        );

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create config directory {}", dir.display()))?;

        let json = serde_json::to_string_pretty(&serde_json::Value::Object(document))
            .context("Failed to serialize config file")?;

        // Write next to the target and rename so a crash never leaves half a file
        let mut temp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        temp.write_all(json.as_bytes())
            .context("Failed to write config file")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(temp.path(), std::fs::Permissions::from_mode(0o600))
                .context("Failed to restrict config file permissions")?;
        }

        temp.persist(&self.path)
            .with_context(|| format!("Failed to write config file {}", self.path.display()))?;

        info!("Saved credentials to {}", self.path.display());
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Home directory, preferring `$HOME` over the platform lookup.
pub fn home_dir() -> Result<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow!("Could not determine home directory"))
}

/// `$HOME/.workstate/config.json`
pub fn default_config_path() -> Result<PathBuf> {
    Ok(home_dir()?.join(CONFIG_DIR).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn valid() -> Credentials {
        Credentials::new("AKIAEXAMPLE", "super-secret", "us-east-1", "my-bucket")
    }

    #[test]
    fn test_new_trims_fields() {
        let credentials = Credentials::new(" AKIA ", "secret\n", " eu-west-2", "bucket ");
        assert_eq!(credentials.access_key_id, "AKIA");
        assert_eq!(credentials.secret_access_key, "secret");
        assert_eq!(credentials.region, "eu-west-2");
        assert_eq!(credentials.bucket_name, "bucket");
    }

    #[test]
    fn test_valid_credentials() {
        assert!(valid().is_valid());
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_all_blank_fields_reported_together() {
        let credentials = Credentials::new("", "   ", "us-east-1", "");
        assert_eq!(
            credentials.problems(),
            vec![CredentialsError::MissingFields {
                fields: vec![ACCESS_KEY_ID, SECRET_ACCESS_KEY, BUCKET_NAME]
            }]
        );
    }

    #[test]
    fn test_region_format() {
        for region in ["us-east-1", "ap-southeast-2", "us-gov-west-1", "eu-central-1"] {
            let credentials = Credentials::new("a", "b", region, "c");
            assert!(credentials.is_valid(), "{} should be valid", region);
        }

        for region in ["useast1", "US-EAST-1", "us-east", "moon-base-1"] {
            let credentials = Credentials::new("a", "b", region, "c");
            assert!(
                matches!(
                    credentials.validate(),
                    Err(CredentialsError::InvalidRegion { .. })
                ),
                "{} should be rejected",
                region
            );
        }
    }

    #[test]
    fn test_missing_and_invalid_region_both_reported() {
        let credentials = Credentials::new("", "b", "nowhere", "c");
        assert_eq!(credentials.problems().len(), 2);
    }

    #[test]
    fn test_debug_hides_secret() {
        let output = format!("{:?}", valid());
        assert!(!output.contains("super-secret"));
        assert!(!output.contains("AKIAEXAMPLE"));
        assert!(output.contains("AKI***"));
        assert!(output.contains("my-bucket"));
    }

    #[test]
    fn test_masking() {
        assert_eq!(valid().masked_secret_key(), "sup***");
        assert_eq!(Credentials::new("ab", "", "", "").masked_access_key(), "ab***");
    }

    #[test]
    fn test_blank_endpoint_is_cleared() {
        let credentials = valid().with_endpoint(Some("  "));
        assert_eq!(credentials.endpoint, None);

        let credentials = valid().with_endpoint(Some("http://localhost:9000"));
        assert_eq!(credentials.endpoint.as_deref(), Some("http://localhost:9000"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("config.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested/config.json"));

        store.save(&valid()).unwrap();
        assert_eq!(store.load().unwrap(), Some(valid()));
    }

    #[test]
    fn test_save_preserves_other_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"theme": "dark", "aws": {"region": "old"}}"#).unwrap();

        let store = FileCredentialStore::new(&path);
        store.save(&valid()).unwrap();

        let document: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(document["theme"], "dark");
        assert_eq!(document["aws"]["region"], "us-east-1");
        assert_eq!(document["aws"]["bucket_name"], "my-bucket");
        assert!(document["aws"].get("endpoint").is_none());
    }

    #[test]
    fn test_partial_section_loads_for_validation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"aws": {"region": "us-east-1"}}"#).unwrap();

        let credentials = FileCredentialStore::new(&path).load().unwrap().unwrap();
        assert_eq!(
            credentials.validate(),
            Err(CredentialsError::MissingFields {
                fields: vec![ACCESS_KEY_ID, SECRET_ACCESS_KEY, BUCKET_NAME]
            })
        );
    }

    #[test]
    fn test_missing_fields_deserialize_to_defaults() {
        let credentials: Credentials = serde_json::from_str("{}").unwrap();
        assert_eq!(credentials, Credentials::default());

        let credentials: Credentials =
            serde_json::from_str(r#"{"secret_access_key": "s3cr3t", "endpoint": "http://minio:9000"}"#)
                .unwrap();
        assert_eq!(credentials.secret_access_key, "s3cr3t");
        assert_eq!(credentials.endpoint.as_deref(), Some("http://minio:9000"));
        assert!(credentials.access_key_id.is_empty());
        assert!(credentials.bucket_name.is_empty());
    }

    #[test]
    fn test_non_object_document_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        assert!(FileCredentialStore::new(&path).load().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("config.json"));
        store.save(&valid()).unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    #[serial]
    fn test_default_path_uses_home() {
        let dir = TempDir::new().unwrap();
        let previous = std::env::var_os("HOME");
        std::env::set_var("HOME", dir.path());

        let path = default_config_path().unwrap();

        match previous {
            Some(home) => std::env::set_var("HOME", home),
            None => std::env::remove_var("HOME"),
        }
        assert_eq!(path, dir.path().join(".workstate").join("config.json"));
    }
}

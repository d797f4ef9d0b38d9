use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::migrate::OwnerPatch;
use crate::remote::DEFAULT_API_URL;
use crate::storage::{FsObjectStore, HttpObjectStore, ObjectStore};

/// Settings for a migration run, usually read from a TOML file and then
/// overridden from the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrateConfig {
    /// Legacy (V0) database.
    pub source: Option<PathBuf>,
    /// Current (V1) database.
    pub target: Option<PathBuf>,
    pub scm: ScmConfig,
    pub ci: CiConfig,
    pub storage: StorageConfig,
    pub owner_patches: Vec<OwnerPatch>,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            source: None,
            target: None,
            scm: ScmConfig::default(),
            ci: CiConfig::default(),
            storage: StorageConfig::default(),
            owner_patches: OwnerPatch::defaults(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScmConfig {
    pub api_url: String,
    /// Used for every repository lookup instead of the owner's credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_token: Option<String>,
}

impl Default for ScmConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            override_token: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Fs,
    Http,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub kind: StorageKind,
    /// Root directory for `fs` storage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    /// Base URL for `http` storage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    pub prefix: String,
}

fn missing(setting: &str) -> Error {
    Error::Config(format!("{setting} is not set"))
}

impl MigrateConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::parse(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.message().to_string()))
    }

    pub fn source_path(&self) -> Result<&Path> {
        self.source.as_deref().ok_or_else(|| missing("source database"))
    }

    pub fn target_path(&self) -> Result<&Path> {
        self.target.as_deref().ok_or_else(|| missing("target database"))
    }

    pub fn ci_server_url(&self) -> Result<&str> {
        self.ci
            .server_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| missing("ci.server_url"))
    }

    /// The override token, if one is configured and non-empty.
    #[must_use]
    pub fn override_token(&self) -> Option<&str> {
        self.scm.override_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn bucket(&self) -> Result<&str> {
        self.storage
            .bucket
            .as_deref()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| missing("storage.bucket"))
    }

    /// Builds the configured object storage backend.
    pub fn object_store(&self) -> Result<Box<dyn ObjectStore>> {
        match self.storage.kind {
            StorageKind::Fs => {
                let root = self.storage.root.as_deref().ok_or_else(|| missing("storage.root"))?;
                Ok(Box::new(FsObjectStore::new(root)))
            }
            StorageKind::Http => {
                let endpoint = self
                    .storage
                    .endpoint
                    .as_deref()
                    .ok_or_else(|| missing("storage.endpoint"))?;
                Ok(Box::new(HttpObjectStore::new(
                    endpoint,
                    self.storage.token.clone(),
                )?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
source = "/var/lib/ci/legacy.sqlite"
target = "/var/lib/ci/current.sqlite"

[scm]
api_url = "https://github.example.com/api/v3"

[ci]
server_url = "https://ci.example.com"

[storage]
kind = "http"
endpoint = "https://s3.example.com"
bucket = "ci-logs"
prefix = "logs"

[[owner_patches]]
from = "ACME"
to = "acme"
"#;

    #[test]
    fn test_parse_full_file() {
        let config = MigrateConfig::parse(SAMPLE).unwrap();

        assert_eq!(
            config.source_path().unwrap(),
            Path::new("/var/lib/ci/legacy.sqlite")
        );
        assert_eq!(config.scm.api_url, "https://github.example.com/api/v3");
        assert_eq!(config.ci_server_url().unwrap(), "https://ci.example.com");
        assert_eq!(config.storage.kind, StorageKind::Http);
        assert_eq!(config.bucket().unwrap(), "ci-logs");
        assert_eq!(config.storage.prefix, "logs");
        assert_eq!(config.owner_patches, vec![OwnerPatch::new("ACME", "acme")]);
        assert!(config.override_token().is_none());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = MigrateConfig::parse("").unwrap();

        assert_eq!(config, MigrateConfig::default());
        assert_eq!(config.scm.api_url, DEFAULT_API_URL);
        assert_eq!(config.storage.kind, StorageKind::Fs);
        assert_eq!(config.owner_patches, OwnerPatch::defaults());
    }

    #[test]
    fn test_missing_settings_are_named() {
        let config = MigrateConfig::default();

        let err = config.target_path().unwrap_err();
        assert!(err.to_string().contains("target database"));

        let err = config.ci_server_url().unwrap_err();
        assert!(err.to_string().contains("ci.server_url"));

        let Err(err) = config.object_store() else {
            panic!("expected missing storage root");
        };
        assert!(err.to_string().contains("storage.root"));
    }

    #[test]
    fn test_empty_override_token_is_ignored() {
        let mut config = MigrateConfig::default();
        config.scm.override_token = Some(String::new());
        assert!(config.override_token().is_none());

        config.scm.override_token = Some("ghp_override".to_string());
        assert_eq!(config.override_token(), Some("ghp_override"));
    }

    #[test]
    fn test_rejects_unknown_storage_kind() {
        let err = MigrateConfig::parse("[storage]\nkind = \"ftp\"\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("migrate.toml");
        fs::write(&path, "source = 42\n").unwrap();

        let err = MigrateConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("migrate.toml"));
    }
}

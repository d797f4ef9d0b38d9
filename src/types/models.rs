use serde::{Deserialize, Serialize};

/// Literal SCM type recorded for every migrated repository.
pub const SCM_GIT: &str = "git";

/// Prefix of the placeholder identifier assigned to repositories before reconciliation.
pub const TEMP_UID_PREFIX: &str = "temp_";

/// Name of the secret holding a repository's aggregated registry credentials.
pub const DOCKER_CONFIG_SECRET: &str = ".dockerconfigjson";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub login: String,
    pub email: String,
    pub machine: bool,
    pub admin: bool,
    pub active: bool,
    pub avatar: String,
    pub syncing: bool,
    pub synced: i64,
    pub created: i64,
    pub updated: i64,
    pub last_login: i64,
    #[serde(skip)]
    pub token: String,
    #[serde(skip)]
    pub refresh: String,
    pub expiry: i64,
    #[serde(skip)]
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repo {
    pub id: i64,
    pub uid: String,
    pub user_id: i64,
    pub namespace: String,
    pub name: String,
    pub slug: String,
    pub scm: String,
    pub http_url: String,
    pub ssh_url: String,
    pub link: String,
    pub branch: String,
    pub private: bool,
    pub visibility: String,
    pub active: bool,
    pub config: String,
    pub trusted: bool,
    pub protected: bool,
    pub ignore_forks: bool,
    pub ignore_pulls: bool,
    pub cancel_pulls: bool,
    pub cancel_push: bool,
    pub timeout: i64,
    pub counter: i64,
    pub synced: i64,
    pub created: i64,
    pub updated: i64,
    pub version: i64,
    #[serde(skip)]
    pub signer: String,
    #[serde(skip)]
    pub secret: String,
}

impl Repo {
    /// Placeholder identifier for a repository that has not been reconciled yet.
    #[must_use]
    pub fn placeholder_uid(id: i64) -> String {
        format!("{TEMP_UID_PREFIX}{id}")
    }

    #[must_use]
    pub fn has_placeholder_uid(&self) -> bool {
        self.uid.starts_with(TEMP_UID_PREFIX)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Secret {
    /// `None` lets the target store assign the key.
    pub id: Option<i64>,
    pub repo_id: i64,
    pub name: String,
    #[serde(skip)]
    pub data: String,
    pub pull_request: bool,
    pub pull_request_push: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Log {
    pub id: i64,
    pub data: Vec<u8>,
}

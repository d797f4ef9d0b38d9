//! Records as they are stored in the legacy (V0) datastore.
//!
//! These are read-only: the migrator never writes to the source store.

#[derive(Debug, Clone)]
pub struct UserV0 {
    pub id: i64,
    pub login: String,
    pub token: String,
    pub secret: String,
    pub expiry: i64,
    pub email: String,
    pub avatar: String,
    pub active: bool,
    pub admin: bool,
    pub hash: String,
    pub synced: i64,
}

#[derive(Debug, Clone)]
pub struct RepoV0 {
    pub id: i64,
    pub user_id: i64,
    pub owner: String,
    pub name: String,
    pub full_name: String,
    pub avatar: String,
    pub link: String,
    pub clone: String,
    pub branch: String,
    pub timeout: i64,
    pub is_private: bool,
    pub is_trusted: bool,
    pub is_gated: bool,
    pub is_active: bool,
    pub allow_pull: bool,
    pub allow_push: bool,
    pub config: String,
    pub visibility: String,
    pub counter: i64,
    pub hash: String,
}

#[derive(Debug, Clone)]
pub struct SecretV0 {
    pub id: i64,
    pub repo_id: i64,
    pub name: String,
    pub value: String,
    pub images: Vec<String>,
    pub events: Vec<String>,
    pub skip_verify: bool,
    pub conceal: bool,
}

impl SecretV0 {
    /// Whether the legacy secret was exposed to pull request builds.
    #[must_use]
    pub fn exposed_to_pulls(&self) -> bool {
        self.events.iter().any(|event| event == "pull_request")
    }
}

/// A registry credential joined with the slug of the repository that owns it.
#[derive(Debug, Clone)]
pub struct RegistryV0 {
    pub id: i64,
    pub repo_id: i64,
    pub repo_full_name: String,
    pub addr: String,
    pub username: String,
    pub password: String,
    pub email: String,
    pub token: String,
}

/// A build process. Child processes (`ppid != 0`) are the steps that own logs.
#[derive(Debug, Clone)]
pub struct StepV0 {
    pub id: i64,
    pub build_id: i64,
    pub pid: i64,
    pub ppid: i64,
    pub name: String,
    pub state: String,
}

#[derive(Debug, Clone)]
pub struct LogV0 {
    pub id: i64,
    pub proc_id: i64,
    pub data: Vec<u8>,
}

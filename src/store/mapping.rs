use rusqlite::Row;
use rusqlite::types::Value;

use super::row::{FromRow, Record, flag, int, text};
use crate::types::*;

impl FromRow for UserV0 {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(UserV0 {
            id: row.get("user_id")?,
            login: text(row, "user_login")?,
            token: text(row, "user_token")?,
            secret: text(row, "user_secret")?,
            expiry: int(row, "user_expiry")?,
            email: text(row, "user_email")?,
            avatar: text(row, "user_avatar")?,
            active: flag(row, "user_active")?,
            admin: flag(row, "user_admin")?,
            hash: text(row, "user_hash")?,
            synced: int(row, "user_synced")?,
        })
    }
}

impl FromRow for RepoV0 {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(RepoV0 {
            id: row.get("repo_id")?,
            user_id: int(row, "repo_user_id")?,
            owner: text(row, "repo_owner")?,
            name: text(row, "repo_name")?,
            full_name: text(row, "repo_full_name")?,
            avatar: text(row, "repo_avatar")?,
            link: text(row, "repo_link")?,
            clone: text(row, "repo_clone")?,
            branch: text(row, "repo_branch")?,
            timeout: int(row, "repo_timeout")?,
            is_private: flag(row, "repo_private")?,
            is_trusted: flag(row, "repo_trusted")?,
            is_gated: flag(row, "repo_gated")?,
            is_active: flag(row, "repo_active")?,
            allow_pull: flag(row, "repo_allow_pr")?,
            allow_push: flag(row, "repo_allow_push")?,
            config: text(row, "repo_config_path")?,
            visibility: text(row, "repo_visibility")?,
            counter: int(row, "repo_counter")?,
            hash: text(row, "repo_hash")?,
        })
    }
}

/// Legacy list columns hold a JSON array of strings; anything else reads as empty.
fn string_list(row: &Row<'_>, column: &str) -> rusqlite::Result<Vec<String>> {
    let raw = text(row, column)?;
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!("Invalid list in column {}: '{}' - {}", column, raw, e);
        Vec::new()
    }))
}

impl FromRow for SecretV0 {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(SecretV0 {
            id: row.get("secret_id")?,
            repo_id: int(row, "secret_repo_id")?,
            name: text(row, "secret_name")?,
            value: text(row, "secret_value")?,
            images: string_list(row, "secret_images")?,
            events: string_list(row, "secret_events")?,
            skip_verify: flag(row, "secret_skip_verify")?,
            conceal: flag(row, "secret_conceal")?,
        })
    }
}

impl FromRow for RegistryV0 {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(RegistryV0 {
            id: row.get("registry_id")?,
            repo_id: int(row, "registry_repo_id")?,
            repo_full_name: text(row, "repo_full_name")?,
            addr: text(row, "registry_addr")?,
            username: text(row, "registry_username")?,
            password: text(row, "registry_password")?,
            email: text(row, "registry_email")?,
            token: text(row, "registry_token")?,
        })
    }
}

impl FromRow for StepV0 {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(StepV0 {
            id: row.get("proc_id")?,
            build_id: int(row, "proc_build_id")?,
            pid: int(row, "proc_pid")?,
            ppid: int(row, "proc_ppid")?,
            name: text(row, "proc_name")?,
            state: text(row, "proc_state")?,
        })
    }
}

impl FromRow for LogV0 {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(LogV0 {
            id: row.get("log_id")?,
            proc_id: int(row, "log_job_id")?,
            data: bytes(row, "log_data")?,
        })
    }
}

/// Log bodies were written as either text or blobs.
fn bytes(row: &Row<'_>, column: &str) -> rusqlite::Result<Vec<u8>> {
    Ok(match row.get::<_, Value>(column)? {
        Value::Blob(data) => data,
        Value::Text(data) => data.into_bytes(),
        _ => Vec::new(),
    })
}

impl FromRow for User {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get("user_id")?,
            login: row.get("user_login")?,
            email: row.get("user_email")?,
            admin: row.get("user_admin")?,
            machine: row.get("user_machine")?,
            active: row.get("user_active")?,
            avatar: row.get("user_avatar")?,
            syncing: row.get("user_syncing")?,
            synced: row.get("user_synced")?,
            created: row.get("user_created")?,
            updated: row.get("user_updated")?,
            last_login: row.get("user_last_login")?,
            token: row.get("user_oauth_token")?,
            refresh: row.get("user_oauth_refresh")?,
            expiry: row.get("user_oauth_expiry")?,
            hash: row.get("user_hash")?,
        })
    }
}

impl Record for User {
    const TABLE: &'static str = "users";
    const PRIMARY_KEY: &'static str = "user_id";
    const COLUMNS: &'static [&'static str] = &[
        "user_login",
        "user_email",
        "user_admin",
        "user_machine",
        "user_active",
        "user_avatar",
        "user_syncing",
        "user_synced",
        "user_created",
        "user_updated",
        "user_last_login",
        "user_oauth_token",
        "user_oauth_refresh",
        "user_oauth_expiry",
        "user_hash",
    ];
    const IMMUTABLE: &'static [&'static str] = &["user_login", "user_created", "user_hash"];

    fn id(&self) -> Option<i64> {
        Some(self.id)
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.login.clone()),
            Value::Text(self.email.clone()),
            Value::from(self.admin),
            Value::from(self.machine),
            Value::from(self.active),
            Value::Text(self.avatar.clone()),
            Value::from(self.syncing),
            Value::Integer(self.synced),
            Value::Integer(self.created),
            Value::Integer(self.updated),
            Value::Integer(self.last_login),
            Value::Text(self.token.clone()),
            Value::Text(self.refresh.clone()),
            Value::Integer(self.expiry),
            Value::Text(self.hash.clone()),
        ]
    }
}

impl FromRow for Repo {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Repo {
            id: row.get("repo_id")?,
            uid: row.get("repo_uid")?,
            user_id: row.get("repo_user_id")?,
            namespace: row.get("repo_namespace")?,
            name: row.get("repo_name")?,
            slug: row.get("repo_slug")?,
            scm: row.get("repo_scm")?,
            http_url: row.get("repo_clone_url")?,
            ssh_url: row.get("repo_ssh_url")?,
            link: row.get("repo_html_url")?,
            active: row.get("repo_active")?,
            private: row.get("repo_private")?,
            visibility: row.get("repo_visibility")?,
            branch: row.get("repo_branch")?,
            counter: row.get("repo_counter")?,
            config: row.get("repo_config")?,
            timeout: row.get("repo_timeout")?,
            trusted: row.get("repo_trusted")?,
            protected: row.get("repo_protected")?,
            ignore_forks: row.get("repo_no_forks")?,
            ignore_pulls: row.get("repo_no_pulls")?,
            cancel_pulls: row.get("repo_cancel_pulls")?,
            cancel_push: row.get("repo_cancel_push")?,
            synced: row.get("repo_synced")?,
            created: row.get("repo_created")?,
            updated: row.get("repo_updated")?,
            version: row.get("repo_version")?,
            signer: row.get("repo_signer")?,
            secret: row.get("repo_secret")?,
        })
    }
}

impl Record for Repo {
    const TABLE: &'static str = "repos";
    const PRIMARY_KEY: &'static str = "repo_id";
    const COLUMNS: &'static [&'static str] = &[
        "repo_uid",
        "repo_user_id",
        "repo_namespace",
        "repo_name",
        "repo_slug",
        "repo_scm",
        "repo_clone_url",
        "repo_ssh_url",
        "repo_html_url",
        "repo_active",
        "repo_private",
        "repo_visibility",
        "repo_branch",
        "repo_counter",
        "repo_config",
        "repo_timeout",
        "repo_trusted",
        "repo_protected",
        "repo_no_forks",
        "repo_no_pulls",
        "repo_cancel_pulls",
        "repo_cancel_push",
        "repo_synced",
        "repo_created",
        "repo_updated",
        "repo_version",
        "repo_signer",
        "repo_secret",
    ];
    const IMMUTABLE: &'static [&'static str] =
        &["repo_uid", "repo_created", "repo_signer", "repo_secret"];

    fn id(&self) -> Option<i64> {
        Some(self.id)
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.uid.clone()),
            Value::Integer(self.user_id),
            Value::Text(self.namespace.clone()),
            Value::Text(self.name.clone()),
            Value::Text(self.slug.clone()),
            Value::Text(self.scm.clone()),
            Value::Text(self.http_url.clone()),
            Value::Text(self.ssh_url.clone()),
            Value::Text(self.link.clone()),
            Value::from(self.active),
            Value::from(self.private),
            Value::Text(self.visibility.clone()),
            Value::Text(self.branch.clone()),
            Value::Integer(self.counter),
            Value::Text(self.config.clone()),
            Value::Integer(self.timeout),
            Value::from(self.trusted),
            Value::from(self.protected),
            Value::from(self.ignore_forks),
            Value::from(self.ignore_pulls),
            Value::from(self.cancel_pulls),
            Value::from(self.cancel_push),
            Value::Integer(self.synced),
            Value::Integer(self.created),
            Value::Integer(self.updated),
            Value::Integer(self.version),
            Value::Text(self.signer.clone()),
            Value::Text(self.secret.clone()),
        ]
    }
}

impl FromRow for Secret {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Secret {
            id: Some(row.get("secret_id")?),
            repo_id: row.get("secret_repo_id")?,
            name: row.get("secret_name")?,
            data: row.get("secret_data")?,
            pull_request: row.get("secret_pull_request")?,
            pull_request_push: row.get("secret_pull_request_push")?,
        })
    }
}

impl Record for Secret {
    const TABLE: &'static str = "secrets";
    const PRIMARY_KEY: &'static str = "secret_id";
    const COLUMNS: &'static [&'static str] = &[
        "secret_repo_id",
        "secret_name",
        "secret_data",
        "secret_pull_request",
        "secret_pull_request_push",
    ];
    const IMMUTABLE: &'static [&'static str] = &["secret_repo_id"];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.repo_id),
            Value::Text(self.name.clone()),
            Value::Text(self.data.clone()),
            Value::from(self.pull_request),
            Value::from(self.pull_request_push),
        ]
    }
}

impl FromRow for Log {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Log {
            id: row.get("log_id")?,
            data: bytes(row, "log_data")?,
        })
    }
}

impl Record for Log {
    const TABLE: &'static str = "logs";
    const PRIMARY_KEY: &'static str = "log_id";
    const COLUMNS: &'static [&'static str] = &["log_data"];

    fn id(&self) -> Option<i64> {
        Some(self.id)
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::Blob(self.data.clone())]
    }
}

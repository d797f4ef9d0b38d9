/// Current (V1) schema. The migrator creates it on the target store.
pub const SCHEMA: &str = r#"
-- Accounts; user_id is carried over from the legacy store
CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_login TEXT NOT NULL UNIQUE,
    user_email TEXT NOT NULL DEFAULT '',
    user_admin INTEGER NOT NULL DEFAULT 0,
    user_machine INTEGER NOT NULL DEFAULT 0,
    user_active INTEGER NOT NULL DEFAULT 1,
    user_avatar TEXT NOT NULL DEFAULT '',
    user_syncing INTEGER NOT NULL DEFAULT 0,
    user_synced INTEGER NOT NULL DEFAULT 0,
    user_created INTEGER NOT NULL DEFAULT 0,
    user_updated INTEGER NOT NULL DEFAULT 0,
    user_last_login INTEGER NOT NULL DEFAULT 0,
    user_oauth_token TEXT NOT NULL DEFAULT '',
    user_oauth_refresh TEXT NOT NULL DEFAULT '',
    user_oauth_expiry INTEGER NOT NULL DEFAULT 0,
    user_hash TEXT NOT NULL UNIQUE
);

-- Repositories; repo_uid starts as a placeholder until reconciled with the SCM provider
CREATE TABLE IF NOT EXISTS repos (
    repo_id INTEGER PRIMARY KEY AUTOINCREMENT,
    repo_uid TEXT NOT NULL DEFAULT '',
    repo_user_id INTEGER NOT NULL DEFAULT 0,
    repo_namespace TEXT NOT NULL,
    repo_name TEXT NOT NULL,
    repo_slug TEXT NOT NULL UNIQUE,
    repo_scm TEXT NOT NULL DEFAULT '',
    repo_clone_url TEXT NOT NULL DEFAULT '',
    repo_ssh_url TEXT NOT NULL DEFAULT '',
    repo_html_url TEXT NOT NULL DEFAULT '',
    repo_active INTEGER NOT NULL DEFAULT 0,
    repo_private INTEGER NOT NULL DEFAULT 0,
    repo_visibility TEXT NOT NULL DEFAULT '',
    repo_branch TEXT NOT NULL DEFAULT '',
    repo_counter INTEGER NOT NULL DEFAULT 0,
    repo_config TEXT NOT NULL DEFAULT '',
    repo_timeout INTEGER NOT NULL DEFAULT 0,
    repo_trusted INTEGER NOT NULL DEFAULT 0,
    repo_protected INTEGER NOT NULL DEFAULT 0,
    repo_no_forks INTEGER NOT NULL DEFAULT 0,
    repo_no_pulls INTEGER NOT NULL DEFAULT 0,
    repo_cancel_pulls INTEGER NOT NULL DEFAULT 0,
    repo_cancel_push INTEGER NOT NULL DEFAULT 0,
    repo_synced INTEGER NOT NULL DEFAULT 0,
    repo_created INTEGER NOT NULL DEFAULT 0,
    repo_updated INTEGER NOT NULL DEFAULT 0,
    repo_version INTEGER NOT NULL DEFAULT 1,
    repo_signer TEXT NOT NULL DEFAULT '',
    repo_secret TEXT NOT NULL DEFAULT ''
);

-- Secrets, including the per-repo registry credential document
CREATE TABLE IF NOT EXISTS secrets (
    secret_id INTEGER PRIMARY KEY AUTOINCREMENT,
    secret_repo_id INTEGER NOT NULL REFERENCES repos(repo_id) ON DELETE CASCADE,
    secret_name TEXT NOT NULL,
    secret_data TEXT NOT NULL DEFAULT '',
    secret_pull_request INTEGER NOT NULL DEFAULT 0,
    secret_pull_request_push INTEGER NOT NULL DEFAULT 0,

    UNIQUE(secret_repo_id, secret_name)
);

-- Step logs, keyed by step identifier
CREATE TABLE IF NOT EXISTS logs (
    log_id INTEGER PRIMARY KEY,
    log_data BLOB
);

CREATE INDEX IF NOT EXISTS idx_repos_user ON repos(repo_user_id);
CREATE INDEX IF NOT EXISTS idx_repos_uid ON repos(repo_uid);
CREATE INDEX IF NOT EXISTS idx_secrets_repo ON secrets(secret_repo_id);
"#;

/// Legacy (V0) schema. Only the tables and columns the migrator reads.
pub const LEGACY_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_login TEXT NOT NULL UNIQUE,
    user_token TEXT,
    user_secret TEXT,
    user_expiry INTEGER,
    user_email TEXT,
    user_avatar TEXT,
    user_active INTEGER,
    user_admin INTEGER,
    user_hash TEXT,
    user_synced INTEGER
);

CREATE TABLE IF NOT EXISTS repos (
    repo_id INTEGER PRIMARY KEY AUTOINCREMENT,
    repo_user_id INTEGER,
    repo_owner TEXT,
    repo_name TEXT,
    repo_full_name TEXT UNIQUE,
    repo_avatar TEXT,
    repo_link TEXT,
    repo_clone TEXT,
    repo_branch TEXT,
    repo_timeout INTEGER,
    repo_private INTEGER,
    repo_trusted INTEGER,
    repo_allow_pr INTEGER,
    repo_allow_push INTEGER,
    repo_allow_deploys INTEGER,
    repo_allow_tags INTEGER,
    repo_hash TEXT,
    repo_scm TEXT,
    repo_config_path TEXT,
    repo_gated INTEGER,
    repo_visibility TEXT,
    repo_counter INTEGER,
    repo_active INTEGER
);

CREATE TABLE IF NOT EXISTS secrets (
    secret_id INTEGER PRIMARY KEY AUTOINCREMENT,
    secret_repo_id INTEGER,
    secret_name TEXT,
    secret_value TEXT,
    secret_images TEXT,
    secret_events TEXT,
    secret_skip_verify INTEGER,
    secret_conceal INTEGER
);

CREATE TABLE IF NOT EXISTS registry (
    registry_id INTEGER PRIMARY KEY AUTOINCREMENT,
    registry_repo_id INTEGER,
    registry_addr TEXT,
    registry_username TEXT,
    registry_password TEXT,
    registry_email TEXT,
    registry_token TEXT
);

CREATE TABLE IF NOT EXISTS builds (
    build_id INTEGER PRIMARY KEY AUTOINCREMENT,
    build_repo_id INTEGER,
    build_number INTEGER,
    build_event TEXT,
    build_status TEXT
);

CREATE TABLE IF NOT EXISTS procs (
    proc_id INTEGER PRIMARY KEY AUTOINCREMENT,
    proc_build_id INTEGER,
    proc_pid INTEGER,
    proc_ppid INTEGER,
    proc_pgid INTEGER,
    proc_name TEXT,
    proc_state TEXT
);

CREATE TABLE IF NOT EXISTS logs (
    log_id INTEGER PRIMARY KEY AUTOINCREMENT,
    log_job_id INTEGER,
    log_data BLOB
);
"#;

//! Shared fixtures: a seeded legacy database and an empty target database,
//! each in its own temp directory.

#![allow(dead_code)]

use std::path::PathBuf;

use ci_migrate::store::SqliteStore;
use rusqlite::params;
use tempfile::TempDir;

pub struct Fixture {
    pub temp_dir: TempDir,
    pub source: SqliteStore,
    pub target: SqliteStore,
}

impl Fixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");

        let source = SqliteStore::new(temp_dir.path().join("legacy.sqlite")).expect("open source");
        source.initialize_legacy().expect("create legacy schema");

        let target = SqliteStore::new(temp_dir.path().join("current.sqlite")).expect("open target");
        target.initialize().expect("create schema");

        Self {
            temp_dir,
            source,
            target,
        }
    }

    pub fn source_path(&self) -> PathBuf {
        self.temp_dir.path().join("legacy.sqlite")
    }

    pub fn target_path(&self) -> PathBuf {
        self.temp_dir.path().join("current.sqlite")
    }

    pub fn add_user(&self, id: i64, login: &str) {
        self.source
            .connection()
            .execute(
                "INSERT INTO users (user_id, user_login, user_token, user_secret, user_expiry,
                                    user_email, user_avatar, user_active, user_admin, user_hash)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5, '', 1, 1, ?6)",
                params![
                    id,
                    login,
                    format!("{login}-token"),
                    format!("{login}-refresh"),
                    format!("{login}@example.com"),
                    format!("{login}-legacy-hash"),
                ],
            )
            .expect("insert legacy user");
    }

    pub fn add_repo(&self, id: i64, user_id: i64, owner: &str, name: &str) {
        self.source
            .connection()
            .execute(
                "INSERT INTO repos (repo_id, repo_user_id, repo_owner, repo_name, repo_full_name,
                                    repo_link, repo_clone, repo_branch, repo_timeout, repo_private,
                                    repo_trusted, repo_allow_pr, repo_allow_push, repo_config_path,
                                    repo_gated, repo_visibility, repo_counter, repo_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'master', 60, 0, 0, 1, 1, '.drone.yml',
                         0, 'public', 10, 1)",
                params![
                    id,
                    user_id,
                    owner,
                    name,
                    format!("{owner}/{name}"),
                    format!("https://github.com/{owner}/{name}"),
                    format!("https://github.com/{owner}/{name}.git"),
                ],
            )
            .expect("insert legacy repo");
    }

    pub fn add_secret(&self, id: i64, repo_id: i64, name: &str, events: &str) {
        self.source
            .connection()
            .execute(
                "INSERT INTO secrets (secret_id, secret_repo_id, secret_name, secret_value,
                                      secret_images, secret_events, secret_skip_verify,
                                      secret_conceal)
                 VALUES (?1, ?2, ?3, ?4, '[]', ?5, 0, 0)",
                params![id, repo_id, name, format!("{name}-value"), events],
            )
            .expect("insert legacy secret");
    }

    pub fn add_registry(&self, id: i64, repo_id: i64, addr: &str, username: &str) {
        self.source
            .connection()
            .execute(
                "INSERT INTO registry (registry_id, registry_repo_id, registry_addr,
                                       registry_username, registry_password, registry_email,
                                       registry_token)
                 VALUES (?1, ?2, ?3, ?4, 'hunter2', '', '')",
                params![id, repo_id, addr, username],
            )
            .expect("insert legacy registry");
    }

    pub fn add_build(&self, id: i64, repo_id: i64) {
        self.source
            .connection()
            .execute(
                "INSERT INTO builds (build_id, build_repo_id, build_number, build_event,
                                     build_status)
                 VALUES (?1, ?2, ?1, 'push', 'success')",
                params![id, repo_id],
            )
            .expect("insert legacy build");
    }

    /// Adds a step with a log body. `ppid == 0` marks a top-level pipeline
    /// process that carries no log of its own.
    pub fn add_step(&self, id: i64, build_id: i64, ppid: i64, log: Option<&str>) {
        let conn = self.source.connection();
        conn.execute(
            "INSERT INTO procs (proc_id, proc_build_id, proc_pid, proc_ppid, proc_pgid,
                                proc_name, proc_state)
             VALUES (?1, ?2, ?1, ?3, ?1, ?4, 'success')",
            params![id, build_id, ppid, format!("step-{id}")],
        )
        .expect("insert legacy step");

        if let Some(log) = log {
            conn.execute(
                "INSERT INTO logs (log_job_id, log_data) VALUES (?1, ?2)",
                params![id, log.as_bytes()],
            )
            .expect("insert legacy log");
        }
    }

    /// Two real users, a system account, their repositories and secrets.
    pub fn seed(&self) {
        self.add_user(1, "octocat");
        self.add_user(2, "hubot");

        self.add_repo(1, 1, "octocat", "hello-world");
        self.add_repo(2, 1, "octocat", "spoon-knife");
        self.add_repo(3, 2, "NYTimes", "covid-19-data");
        self.add_repo(4, 0, "system", "orphan");

        self.add_secret(1, 1, "docker_password", r#"["push","pull_request"]"#);
        self.add_secret(2, 2, "npm_token", r#"["push","tag"]"#);
        self.add_secret(3, 4, "orphan_secret", r#"["push"]"#);
    }

    pub fn count(&self, table: &str) -> i64 {
        self.target
            .connection()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .expect("count rows")
    }
}

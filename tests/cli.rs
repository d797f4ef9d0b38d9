//! CLI integration tests for ci-migrate commands.
//!
//! Each test uses an isolated temp directory for both databases, ensuring
//! tests can run in parallel safely.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

mod common;

use std::collections::BTreeMap;

use assert_cmd::Command;
use assert_fs::prelude::*;
use ci_migrate::store::row;
use ci_migrate::types::{DOCKER_CONFIG_SECRET, DockerConfig, Secret};
use common::Fixture;
use predicates::prelude::*;

struct TestContext {
    fx: Fixture,
}

impl TestContext {
    fn new() -> Self {
        let fx = Fixture::new();
        fx.seed();
        Self { fx }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("ci-migrate").expect("failed to find binary");
        cmd.env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .env_remove("MIGRATE_CONFIG")
            .env_remove("MIGRATE_SOURCE")
            .env_remove("MIGRATE_TARGET")
            .env_remove("MIGRATE_SCM_TOKEN")
            .env_remove("MIGRATE_CI_SERVER");
        cmd
    }

    /// A command with both database paths set.
    fn run(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.cmd()
            .arg("--source")
            .arg(self.fx.source_path())
            .arg("--target")
            .arg(self.fx.target_path())
            .args(args)
            .assert()
    }
}

#[test]
fn test_migrate_all_runs_in_order() {
    let ctx = TestContext::new();
    ctx.fx.add_registry(1, 1, "gcr.io", "octocat");

    ctx.run(&["migrate-all"]).success();

    assert_eq!(ctx.fx.count("users"), 2);
    assert_eq!(ctx.fx.count("repos"), 3);
    // Two secrets plus one registry credential document.
    assert_eq!(ctx.fx.count("secrets"), 3);

    // Safe to run again.
    ctx.run(&["migrate-all"]).success();
    assert_eq!(ctx.fx.count("repos"), 3);
    assert_eq!(ctx.fx.count("secrets"), 3);
}

#[test]
fn test_secrets_before_repos_migrate_on_rerun() {
    let ctx = TestContext::new();
    ctx.fx.add_registry(1, 2, "gcr.io", "octocat");

    ctx.run(&["migrate-secrets"]).success();
    ctx.run(&["migrate-registries"]).success();
    assert_eq!(ctx.fx.count("secrets"), 0);

    ctx.run(&["migrate-users"]).success();
    ctx.run(&["migrate-repos"]).success();
    ctx.run(&["migrate-secrets"]).success();
    ctx.run(&["migrate-registries"]).success();

    // Two secrets plus one registry credential document.
    assert_eq!(ctx.fx.count("secrets"), 3);

    let secrets: Vec<Secret> = row::query_all(
        &ctx.fx.target.connection(),
        "SELECT * FROM secrets WHERE secret_name = ?1",
        [DOCKER_CONFIG_SECRET],
    )
    .unwrap();
    assert_eq!(secrets.len(), 1);
    assert_eq!(secrets[0].repo_id, 2);

    let config: DockerConfig = serde_json::from_str(&secrets[0].data).unwrap();
    assert_eq!(config.auths["gcr.io"].username, "octocat");
    assert_eq!(config.auths["gcr.io"].password, "hunter2");
}

#[test]
fn test_dump_tokens_to_stdout() {
    let ctx = TestContext::new();

    let output = ctx
        .cmd()
        .arg("--source")
        .arg(ctx.fx.source_path())
        .arg("dump-tokens")
        .output()
        .expect("failed to run command");
    assert!(output.status.success());

    let tokens: BTreeMap<String, String> =
        serde_json::from_slice(&output.stdout).expect("failed to parse JSON");
    assert_eq!(tokens["octocat"], "octocat-legacy-hash");
    assert_eq!(tokens.len(), 2);
}

#[test]
fn test_dump_tokens_to_file() {
    let ctx = TestContext::new();
    let out = assert_fs::TempDir::new().unwrap();
    let file = out.child("tokens.json");

    ctx.cmd()
        .arg("--source")
        .arg(ctx.fx.source_path())
        .args(["dump-tokens", "--output"])
        .arg(file.path())
        .assert()
        .success();

    file.assert(predicate::str::contains("\"hubot\": \"hubot-legacy-hash\""));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(file.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

#[test]
fn test_missing_source_fails() {
    let ctx = TestContext::new();

    ctx.cmd()
        .args(["--source", "/nonexistent/legacy.sqlite"])
        .arg("--target")
        .arg(ctx.fx.target_path())
        .arg("migrate-users")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Source database not found"));
}

#[test]
fn test_missing_target_setting_fails() {
    let ctx = TestContext::new();

    ctx.cmd()
        .arg("--source")
        .arg(ctx.fx.source_path())
        .arg("migrate-users")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("target database is not set"));
}

#[test]
fn test_same_source_and_target_rejected() {
    let ctx = TestContext::new();

    ctx.cmd()
        .arg("--source")
        .arg(ctx.fx.source_path())
        .arg("--target")
        .arg(ctx.fx.source_path())
        .arg("migrate-logs")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("different databases"));
}

#[test]
fn test_same_database_through_relative_path_rejected() {
    let ctx = TestContext::new();
    let file_name = ctx.fx.source_path().file_name().unwrap().to_owned();
    let dotted = std::path::Path::new(".").join(&file_name);

    ctx.cmd()
        .current_dir(ctx.fx.temp_dir.path())
        .arg("--source")
        .arg(&file_name)
        .arg("--target")
        .arg(&dotted)
        .arg("migrate-users")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("different databases"));
}

#[test]
fn test_logs_to_object_storage_from_config() {
    let ctx = TestContext::new();
    ctx.fx.add_build(1, 1);
    ctx.fx.add_step(10, 1, 0, None);
    ctx.fx.add_step(11, 1, 10, Some("cloning"));

    let dir = assert_fs::TempDir::new().unwrap();
    let objects = dir.child("objects");
    let config = dir.child("migrate.toml");
    config
        .write_str(&format!(
            "[storage]\nkind = \"fs\"\nroot = {:?}\nbucket = \"ci-logs\"\nprefix = \"logs\"\n",
            objects.path().display().to_string()
        ))
        .unwrap();

    ctx.cmd()
        .arg("--config")
        .arg(config.path())
        .arg("--source")
        .arg(ctx.fx.source_path())
        .args(["migrate-logs-to-object-storage", "--prefix", "archive"])
        .assert()
        .success();

    objects
        .child("ci-logs/archive/11")
        .assert(predicate::str::contains("cloning"));
}

#[test]
fn test_partial_failure_exit_code() {
    let ctx = TestContext::new();
    ctx.run(&["migrate-all"]).success();

    // Nothing listens on port 1, so every activation fails independently.
    ctx.run(&["activate-repos", "--server-url", "http://127.0.0.1:1"])
        .code(2)
        .stderr(predicate::str::contains("3 item(s) failed"));
}

#[test]
fn test_activate_requires_server_url() {
    let ctx = TestContext::new();

    ctx.run(&["activate-repos"])
        .code(1)
        .stderr(predicate::str::contains("ci.server_url"));
}

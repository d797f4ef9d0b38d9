use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ci_migrate::config::MigrateConfig;
use ci_migrate::error::Error;
use ci_migrate::migrate::{self, Report};
use ci_migrate::remote::{CiApiClient, GithubClient};
use ci_migrate::store::SqliteStore;

/// Exit status when every item was processed but some failed.
const EXIT_PARTIAL: u8 = 2;

#[cfg(unix)]
fn set_restrictive_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Failed to set permissions on {}: {e}", path.display());
    }
}

#[cfg(not(unix))]
fn set_restrictive_permissions(_path: &Path) {}

#[derive(Parser)]
#[command(name = "ci-migrate")]
#[command(about = "Migrates a legacy CI datastore to the current schema", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true, env = "MIGRATE_CONFIG")]
    config: Option<PathBuf>,

    /// Legacy (V0) database
    #[arg(long, global = true, env = "MIGRATE_SOURCE")]
    source: Option<PathBuf>,

    /// Current (V1) database
    #[arg(long, global = true, env = "MIGRATE_TARGET")]
    target: Option<PathBuf>,

    /// Token used for every SCM lookup instead of the repository owner's
    #[arg(long, global = true, env = "MIGRATE_SCM_TOKEN", hide_env_values = true)]
    scm_token: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate user accounts
    MigrateUsers,

    /// Write the login to hash mapping as JSON
    DumpTokens {
        /// Output file (defaults to stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Migrate repositories with placeholder identifiers
    MigrateRepos,

    /// Migrate repository secrets
    MigrateSecrets,

    /// Migrate registry credentials into per-repository secrets
    MigrateRegistries,

    /// Migrate step logs into the target database
    MigrateLogs {
        /// Only migrate logs of builds after this build id
        #[arg(long, default_value_t = 0)]
        after_build: i64,
    },

    /// Upload step logs to object storage
    MigrateLogsToObjectStorage {
        /// Bucket name (overrides storage.bucket)
        #[arg(long)]
        bucket: Option<String>,

        /// Key prefix (overrides storage.prefix)
        #[arg(long)]
        prefix: Option<String>,

        /// Only upload logs of builds after this build id
        #[arg(long, default_value_t = 0)]
        after_build: i64,
    },

    /// Replace placeholder repository identifiers with the SCM provider's
    UpdateRepoIdentifiers,

    /// Update identifiers and remove renamed or missing repositories in one pass
    ReconcileRepos,

    /// Remove repositories renamed at the SCM provider
    RemoveRenamedRepos,

    /// Remove repositories the SCM provider cannot find
    RemoveNotfoundRepos,

    /// Re-activate active repositories through the CI server
    ActivateRepos {
        /// CI server URL (overrides ci.server_url)
        #[arg(long, env = "MIGRATE_CI_SERVER")]
        server_url: Option<String>,
    },

    /// Check that active repositories are reachable with their owner's credential
    PreflightActivateRepos,

    /// Migrate users, repositories, secrets and registries in order
    MigrateAll,
}

fn load_config(cli: &Cli) -> anyhow::Result<MigrateConfig> {
    let mut config = match &cli.config {
        Some(path) => MigrateConfig::load(path)?,
        None => MigrateConfig::default(),
    };

    if let Some(source) = &cli.source {
        config.source = Some(source.clone());
    }
    if let Some(target) = &cli.target {
        config.target = Some(target.clone());
    }
    if let Some(token) = &cli.scm_token {
        config.scm.override_token = Some(token.clone());
    }

    Ok(config)
}

fn open_source(config: &MigrateConfig) -> anyhow::Result<SqliteStore> {
    let path = config.source_path()?;
    if !path.exists() {
        bail!("Source database not found: {}", path.display());
    }
    SqliteStore::new(path)
        .with_context(|| format!("Failed to open source database {}", path.display()))
}

/// Opens the target database and creates any missing tables.
fn open_target(config: &MigrateConfig) -> anyhow::Result<SqliteStore> {
    let path = config.target_path()?;
    let store = SqliteStore::new(path)
        .with_context(|| format!("Failed to open target database {}", path.display()))?;
    store.initialize()?;
    Ok(store)
}

/// Whether two paths name the same existing file. A missing file matches nothing.
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn open_both(config: &MigrateConfig) -> anyhow::Result<(SqliteStore, SqliteStore)> {
    if same_file(config.source_path()?, config.target_path()?) {
        bail!("Source and target must be different databases");
    }
    Ok((open_source(config)?, open_target(config)?))
}

fn scm_client(config: &MigrateConfig) -> anyhow::Result<GithubClient> {
    Ok(GithubClient::new(&config.scm.api_url)?)
}

fn finish(what: &str, report: Report) -> anyhow::Result<()> {
    info!(
        total = report.total,
        inserted = report.inserted,
        updated = report.updated,
        removed = report.removed,
        skipped = report.skipped,
        failed = report.failures.len(),
        "{what} done"
    );
    report.into_result()?;
    Ok(())
}

fn dump_tokens(config: &MigrateConfig, output: Option<PathBuf>) -> anyhow::Result<()> {
    let source = open_source(config)?;

    match output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(&path)?);
            migrate::dump_tokens(&source, &mut writer)?;
            writer.flush()?;
            set_restrictive_permissions(&path);
            info!("tokens written to {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            migrate::dump_tokens(&source, &mut stdout)?;
            stdout.flush()?;
        }
    }

    Ok(())
}

fn migrate_all(config: &MigrateConfig) -> anyhow::Result<()> {
    let (source, target) = open_both(config)?;

    finish("users", migrate::migrate_users(&source, &target)?)?;
    finish(
        "repositories",
        migrate::migrate_repos(&source, &target, &config.owner_patches)?,
    )?;
    finish("secrets", migrate::migrate_secrets(&source, &target)?)?;
    finish(
        "registries",
        migrate::migrate_registries(&source, &target, &config.owner_patches)?,
    )?;

    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(&cli)?;

    match cli.command {
        Commands::MigrateUsers => {
            let (source, target) = open_both(&config)?;
            finish("users", migrate::migrate_users(&source, &target)?)
        }
        Commands::DumpTokens { output } => dump_tokens(&config, output),
        Commands::MigrateRepos => {
            let (source, target) = open_both(&config)?;
            finish(
                "repositories",
                migrate::migrate_repos(&source, &target, &config.owner_patches)?,
            )
        }
        Commands::MigrateSecrets => {
            let (source, target) = open_both(&config)?;
            finish("secrets", migrate::migrate_secrets(&source, &target)?)
        }
        Commands::MigrateRegistries => {
            let (source, target) = open_both(&config)?;
            finish(
                "registries",
                migrate::migrate_registries(&source, &target, &config.owner_patches)?,
            )
        }
        Commands::MigrateLogs { after_build } => {
            let (source, target) = open_both(&config)?;
            finish("logs", migrate::migrate_logs(&source, &target, after_build)?)
        }
        Commands::MigrateLogsToObjectStorage {
            bucket,
            prefix,
            after_build,
        } => {
            if bucket.is_some() {
                config.storage.bucket = bucket;
            }
            if let Some(prefix) = prefix {
                config.storage.prefix = prefix;
            }
            let source = open_source(&config)?;
            let store = config.object_store()?;
            finish(
                "log uploads",
                migrate::migrate_logs_to_object_storage(
                    &source,
                    store.as_ref(),
                    config.bucket()?,
                    &config.storage.prefix,
                    after_build,
                )?,
            )
        }
        Commands::UpdateRepoIdentifiers => {
            let target = open_target(&config)?;
            let scm = scm_client(&config)?;
            finish(
                "identifier update",
                migrate::update_repo_identifiers(&target, &scm, config.override_token())?,
            )
        }
        Commands::ReconcileRepos => {
            let target = open_target(&config)?;
            let scm = scm_client(&config)?;
            finish(
                "reconciliation",
                migrate::reconcile_repos(&target, &scm, config.override_token())?,
            )
        }
        Commands::RemoveRenamedRepos => {
            let target = open_target(&config)?;
            let scm = scm_client(&config)?;
            finish(
                "renamed removal",
                migrate::remove_renamed(&target, &scm, config.override_token())?,
            )
        }
        Commands::RemoveNotfoundRepos => {
            let target = open_target(&config)?;
            let scm = scm_client(&config)?;
            finish(
                "not found removal",
                migrate::remove_not_found(&target, &scm, config.override_token())?,
            )
        }
        Commands::ActivateRepos { server_url } => {
            if server_url.is_some() {
                config.ci.server_url = server_url;
            }
            let target = open_target(&config)?;
            let ci = CiApiClient::new(config.ci_server_url()?)?;
            finish("activation", migrate::activate_repos(&target, &ci)?)
        }
        Commands::PreflightActivateRepos => {
            let target = open_target(&config)?;
            let scm = scm_client(&config)?;
            finish(
                "activation preflight",
                migrate::preflight_activate_repos(&target, &scm)?,
            )
        }
        Commands::MigrateAll => migrate_all(&config),
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(format!("ci_migrate={level}").parse()?),
        )
        .init();

    let code = match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<Error>() {
            Some(Error::Partial(failures)) => {
                error!("{failures}");
                ExitCode::from(EXIT_PARTIAL)
            }
            _ => {
                error!("{e:#}");
                ExitCode::FAILURE
            }
        },
    };

    Ok(code)
}

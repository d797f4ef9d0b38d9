use std::collections::BTreeMap;

use rusqlite::params;
use tracing::{debug, debug_span, info, warn};

use super::repos::OwnerPatch;
use super::upsert::{apply, repair_sequence};
use super::Report;
use crate::error::Result;
use crate::store::row::{self, Lookup, Record};
use crate::store::SqliteStore;
use crate::types::{AuthConfig, DOCKER_CONFIG_SECRET, DockerConfig, RegistryV0, Repo, Secret};

const REGISTRY_IMPORT_QUERY: &str = "
SELECT repos.repo_full_name, registry.*
FROM registry
INNER JOIN repos ON repos.repo_id = registry.registry_repo_id
WHERE repos.repo_user_id > 0
ORDER BY registry.registry_id
";

const LEGACY_SECRET_MAX_ID_QUERY: &str = "SELECT COALESCE(MAX(secret_id), 0) FROM secrets";

const REPO_SLUG_QUERY: &str = "SELECT * FROM repos WHERE repo_slug = ?1";

const REGISTRY_SECRET_QUERY: &str = "
SELECT *
FROM secrets
WHERE secret_repo_id = ?1 AND secret_name = ?2
";

/// Groups registry rows into one credential-store document per repository slug.
///
/// Slugs pass through the owner patches so they match the migrated repos.
#[must_use]
pub fn aggregate_registries(
    registries: &[RegistryV0],
    patches: &[OwnerPatch],
) -> BTreeMap<String, DockerConfig> {
    let mut configs: BTreeMap<String, DockerConfig> = BTreeMap::new();

    for registry in registries {
        debug!(repo = %registry.repo_full_name, addr = %registry.addr, "prepare registry");

        let slug = OwnerPatch::apply_to_slug(patches, &registry.repo_full_name);
        configs.entry(slug).or_default().insert(
            &registry.addr,
            AuthConfig::new(&registry.username, &registry.password, &registry.email),
        );
    }

    configs
}

/// Migrates registry credentials into one `.dockerconfigjson` secret per
/// repository. Repositories missing from the target are skipped.
pub fn migrate_registries(
    source: &SqliteStore,
    target: &SqliteStore,
    patches: &[OwnerPatch],
) -> Result<Report> {
    let registries: Vec<RegistryV0> =
        row::query_all(&source.connection(), REGISTRY_IMPORT_QUERY, [])?;

    info!("migrating {} registries", registries.len());

    let legacy_max_id: i64 = source
        .connection()
        .query_row(LEGACY_SECRET_MAX_ID_QUERY, [], |row| row.get(0))?;

    let configs = aggregate_registries(&registries, patches);

    let report = target.transaction(|tx| {
        let mut report = Report::new(configs.len());

        // New documents take store-assigned ids; keep them clear of the
        // legacy secret ids `migrate_secrets` writes.
        repair_sequence(tx, Secret::TABLE, legacy_max_id)?;

        for (slug, config) in &configs {
            let span = debug_span!("registry", repo = %slug);
            let _enter = span.enter();
            debug!("migrate registry");

            let repo = match row::query_one::<Repo, _>(tx, REPO_SLUG_QUERY, [slug])? {
                Lookup::Found(repo) => repo,
                Lookup::NotFound => {
                    warn!("repository not migrated, skipping registry credentials");
                    report.skipped += 1;
                    continue;
                }
            };

            let existing = row::query_one::<Secret, _>(
                tx,
                REGISTRY_SECRET_QUERY,
                params![repo.id, DOCKER_CONFIG_SECRET],
            )?;

            let secret = Secret {
                id: existing.into_option().and_then(|secret| secret.id),
                repo_id: repo.id,
                name: DOCKER_CONFIG_SECRET.to_string(),
                data: config.to_json()?,
                pull_request: true,
                pull_request_push: false,
            };
            report.record(apply(tx, &secret)?);

            debug!("migration complete");
        }

        Ok(report)
    })?;

    info!("migration complete");
    Ok(report)
}

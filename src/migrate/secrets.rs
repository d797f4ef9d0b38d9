use rusqlite::Connection;
use tracing::{debug, debug_span, info, warn};

use super::upsert::{HighWatermark, apply, repair_sequence};
use super::Report;
use crate::error::{Error, Result};
use crate::store::row::{self, Lookup, Record};
use crate::store::SqliteStore;
use crate::types::{DOCKER_CONFIG_SECRET, Repo, Secret, SecretV0};

const SECRET_IMPORT_QUERY: &str = "
SELECT secrets.*
FROM secrets
INNER JOIN repos ON secrets.secret_repo_id = repos.repo_id
WHERE repos.repo_user_id > 0
ORDER BY secrets.secret_id
";

#[must_use]
pub fn transform_secret(secret: &SecretV0) -> Secret {
    Secret {
        id: Some(secret.id),
        repo_id: secret.repo_id,
        name: secret.name.clone(),
        data: secret.value.clone(),
        pull_request: secret.exposed_to_pulls(),
        pull_request_push: false,
    }
}

/// Whether a stored row is an earlier migration of the same legacy secret.
/// Registry credential documents share the id space but never match.
fn same_secret(existing: &Secret, incoming: &Secret) -> bool {
    existing.repo_id == incoming.repo_id
        && (existing.name != DOCKER_CONFIG_SECRET || incoming.name == DOCKER_CONFIG_SECRET)
}

/// Moves a row occupying a legacy secret id to a store-assigned id.
fn relocate(tx: &Connection, existing: Secret) -> Result<i64> {
    let Some(id) = existing.id else {
        return Err(Error::MissingPrimaryKey(Secret::TABLE));
    };
    warn!(
        id,
        repo = existing.repo_id,
        secret = %existing.name,
        "legacy secret id taken, relocating stored secret"
    );

    row::delete_by_id::<Secret>(tx, id)?;
    let new_id = row::insert(tx, &Secret { id: None, ..existing })?;
    debug!(id = new_id, "relocated");
    Ok(new_id)
}

/// Migrates repository secrets. Secrets whose repository has not been
/// migrated are skipped; run `migrate_repos` first.
pub fn migrate_secrets(source: &SqliteStore, target: &SqliteStore) -> Result<Report> {
    let secrets: Vec<SecretV0> = row::query_all(&source.connection(), SECRET_IMPORT_QUERY, [])?;

    info!("migrating {} secrets", secrets.len());

    let mut sequence = HighWatermark::default();
    for secret in &secrets {
        sequence.observe(secret.id);
    }

    let report = target.transaction(|tx| {
        let mut report = Report::new(secrets.len());

        // Relocated rows and later store-assigned ids land past every legacy id.
        repair_sequence(tx, Secret::TABLE, sequence.value())?;

        for secret in &secrets {
            let span = debug_span!("secret", repo = secret.repo_id, secret = %secret.name);
            let _enter = span.enter();
            debug!("migrate secret");

            if let Lookup::NotFound = row::find_by_id::<Repo>(tx, secret.repo_id)? {
                warn!("repository {} not migrated, skipping secret", secret.repo_id);
                report.skipped += 1;
                continue;
            }

            let record = transform_secret(secret);
            if let Lookup::Found(existing) = row::find_by_id::<Secret>(tx, secret.id)? {
                if !same_secret(&existing, &record) {
                    relocate(tx, existing)?;
                }
            }

            report.record(apply(tx, &record)?);

            debug!("migration complete");
        }

        Ok(report)
    })?;

    info!("migration complete");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy_secret(events: &[&str]) -> SecretV0 {
        SecretV0 {
            id: 3,
            repo_id: 7,
            name: "docker_password".to_string(),
            value: "correct-horse".to_string(),
            images: Vec::new(),
            events: events.iter().map(|e| e.to_string()).collect(),
            skip_verify: false,
            conceal: false,
        }
    }

    #[test]
    fn test_pull_request_exposure_from_events() {
        let exposed = transform_secret(&legacy_secret(&["push", "pull_request"]));
        assert!(exposed.pull_request);
        assert_eq!(exposed.id, Some(3));
        assert_eq!(exposed.repo_id, 7);
        assert_eq!(exposed.data, "correct-horse");

        let hidden = transform_secret(&legacy_secret(&["push", "tag", "deployment"]));
        assert!(!hidden.pull_request);

        // Membership is literal, not a prefix match.
        let lookalike = transform_secret(&legacy_secret(&["pull_request_target"]));
        assert!(!lookalike.pull_request);
    }

    #[test]
    fn test_registry_document_is_never_the_same_secret() {
        let incoming = transform_secret(&legacy_secret(&["push"]));

        let earlier = Secret {
            data: "stale".to_string(),
            ..incoming.clone()
        };
        assert!(same_secret(&earlier, &incoming));

        let document = Secret {
            name: DOCKER_CONFIG_SECRET.to_string(),
            ..incoming.clone()
        };
        assert!(!same_secret(&document, &incoming));

        let other_repo = Secret {
            repo_id: 8,
            ..incoming.clone()
        };
        assert!(!same_secret(&other_repo, &incoming));
    }
}

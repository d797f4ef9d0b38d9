use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, info};

use super::upsert::{HighWatermark, apply, repair_sequence};
use super::{Report, owned_by_user};
use crate::auth::SecretGenerator;
use crate::error::Result;
use crate::store::row::{self, Record};
use crate::store::SqliteStore;
use crate::types::{Repo, RepoV0, SCM_GIT};

const REPO_IMPORT_QUERY: &str = "
SELECT *
FROM repos
WHERE repo_user_id > 0
ORDER BY repo_id
";

/// One-off rename of a legacy owner namespace, applied before the generic
/// transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerPatch {
    pub from: String,
    pub to: String,
}

impl OwnerPatch {
    #[must_use]
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// The capitalized owner the legacy store recorded for an organization
    /// that the SCM provider reports in lowercase.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![Self::new("NYTimes", "nytimes")]
    }

    /// Rewrites a repo's owner and slug. Returns whether the patch matched.
    pub fn apply(&self, repo: &mut RepoV0) -> bool {
        if repo.owner != self.from {
            return false;
        }
        repo.owner = self.to.clone();
        repo.full_name = format!("{}/{}", self.to, repo.name);
        true
    }

    /// Rewrites the owner part of a `namespace/name` slug.
    #[must_use]
    pub fn apply_to_slug(patches: &[Self], slug: &str) -> String {
        if let Some((owner, name)) = slug.split_once('/') {
            if let Some(patch) = patches.iter().find(|p| p.from == owner) {
                return format!("{}/{}", patch.to, name);
            }
        }
        slug.to_string()
    }
}

/// Maps a legacy repository onto the V1 shape with a placeholder UID.
#[must_use]
pub fn transform_repo(repo: &RepoV0, signer: String, secret: String, now: i64) -> Repo {
    Repo {
        id: repo.id,
        uid: Repo::placeholder_uid(repo.id),
        user_id: repo.user_id,
        namespace: repo.owner.clone(),
        name: repo.name.clone(),
        slug: repo.full_name.clone(),
        scm: SCM_GIT.to_string(),
        http_url: repo.clone.clone(),
        ssh_url: String::new(),
        link: repo.link.clone(),
        branch: repo.branch.clone(),
        private: repo.is_private,
        visibility: repo.visibility.clone(),
        active: repo.is_active,
        config: repo.config.clone(),
        trusted: repo.is_trusted,
        protected: repo.is_gated,
        ignore_forks: false,
        // Pull requests stay enabled unless a real owner disabled them.
        ignore_pulls: !repo.allow_pull && owned_by_user(repo.user_id),
        cancel_pulls: false,
        cancel_push: false,
        timeout: repo.timeout,
        counter: repo.counter,
        synced: now,
        created: now,
        updated: now,
        version: 1,
        signer,
        secret,
    }
}

/// Migrates repositories. All or nothing: every other entity depends on them.
pub fn migrate_repos(
    source: &SqliteStore,
    target: &SqliteStore,
    patches: &[OwnerPatch],
) -> Result<Report> {
    let repos: Vec<RepoV0> = row::query_all(&source.connection(), REPO_IMPORT_QUERY, [])?;

    info!("migrating {} repositories", repos.len());

    let generator = SecretGenerator::new();
    let now = Utc::now().timestamp();

    let report = target.transaction(|tx| {
        let mut report = Report::new(repos.len());
        let mut sequence = HighWatermark::default();

        for repo in &repos {
            sequence.observe(repo.id);

            let span = debug_span!("repo", id = repo.id, repo = %repo.full_name);
            let _enter = span.enter();
            debug!("migrate repository");

            let mut repo = repo.clone();
            for patch in patches {
                if patch.apply(&mut repo) {
                    debug!("renamed owner {} to {}", patch.from, patch.to);
                }
            }

            let (signer, secret) = generator.repo_keys();
            let record = transform_repo(&repo, signer, secret, now);
            report.record(apply(tx, &record)?);

            debug!("migration complete");
        }

        repair_sequence(tx, Repo::TABLE, sequence.value())?;
        Ok(report)
    })?;

    info!("migration complete");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy_repo(user_id: i64, allow_pull: bool) -> RepoV0 {
        RepoV0 {
            id: 7,
            user_id,
            owner: "octocat".to_string(),
            name: "hello-world".to_string(),
            full_name: "octocat/hello-world".to_string(),
            avatar: String::new(),
            link: "https://github.com/octocat/hello-world".to_string(),
            clone: "https://github.com/octocat/hello-world.git".to_string(),
            branch: "main".to_string(),
            timeout: 60,
            is_private: true,
            is_trusted: true,
            is_gated: false,
            is_active: true,
            allow_pull,
            allow_push: true,
            config: ".drone.yml".to_string(),
            visibility: "private".to_string(),
            counter: 314,
            hash: "legacy".to_string(),
        }
    }

    #[test]
    fn test_transform_maps_fields() {
        let repo = transform_repo(&legacy_repo(1, true), "s".into(), "k".into(), 99);

        assert_eq!(repo.id, 7);
        assert_eq!(repo.uid, "temp_7");
        assert_eq!(repo.namespace, "octocat");
        assert_eq!(repo.slug, "octocat/hello-world");
        assert_eq!(repo.scm, "git");
        assert_eq!(repo.http_url, "https://github.com/octocat/hello-world.git");
        assert_eq!(repo.link, "https://github.com/octocat/hello-world");
        assert_eq!(repo.counter, 314);
        assert_eq!(repo.config, ".drone.yml");
        assert!(repo.private);
        assert!(repo.trusted);
        assert!(!repo.protected);
        assert!(repo.active);
        assert_eq!(repo.version, 1);
        assert_eq!((repo.signer.as_str(), repo.secret.as_str()), ("s", "k"));
    }

    #[test]
    fn test_ignore_pulls_requires_real_owner() {
        let disabled = transform_repo(&legacy_repo(1, false), String::new(), String::new(), 0);
        assert!(disabled.ignore_pulls);

        let enabled = transform_repo(&legacy_repo(1, true), String::new(), String::new(), 0);
        assert!(!enabled.ignore_pulls);

        let system = transform_repo(&legacy_repo(0, false), String::new(), String::new(), 0);
        assert!(!system.ignore_pulls);
    }

    #[test]
    fn test_owner_patch_recomputes_slug() {
        let mut repo = legacy_repo(1, true);
        repo.owner = "NYTimes".to_string();
        repo.full_name = "NYTimes/hello-world".to_string();

        let patches = OwnerPatch::defaults();
        assert!(patches[0].apply(&mut repo));
        assert_eq!(repo.owner, "nytimes");
        assert_eq!(repo.full_name, "nytimes/hello-world");

        // Matching is exact; the patched value does not match again.
        assert!(!patches[0].apply(&mut repo));
    }

    #[test]
    fn test_owner_patch_on_slug() {
        let patches = OwnerPatch::defaults();
        assert_eq!(
            OwnerPatch::apply_to_slug(&patches, "NYTimes/hello-world"),
            "nytimes/hello-world"
        );
        assert_eq!(
            OwnerPatch::apply_to_slug(&patches, "octocat/hello-world"),
            "octocat/hello-world"
        );
    }
}

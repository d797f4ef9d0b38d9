use tracing::{debug, debug_span, error, info};

use super::{Report, find_owner};
use crate::auth::ScmToken;
use crate::error::Result;
use crate::remote::{CiClient, ScmClient};
use crate::store::row;
use crate::store::SqliteStore;
use crate::types::Repo;

const ACTIVE_REPO_QUERY: &str = "
SELECT *
FROM repos
WHERE repo_active = 1
ORDER BY repo_id
";

fn active_repos(store: &SqliteStore) -> Result<Vec<Repo>> {
    row::query_all(&store.connection(), ACTIVE_REPO_QUERY, [])
}

/// Re-activates every active repository through the CI server, which creates
/// fresh webhooks. Requests authenticate as the owner via their internal hash.
pub fn activate_repos(store: &SqliteStore, ci: &dyn CiClient) -> Result<Report> {
    let repos = active_repos(store)?;

    info!("begin repository activation");

    let mut report = Report::new(repos.len());

    for repo in &repos {
        let span = debug_span!("repo", repo = %repo.slug);
        let _enter = span.enter();
        debug!("activating repository");

        let owner = find_owner(&store.connection(), repo);
        let result = owner.and_then(|owner| {
            debug!(owner = %owner.login, "activate as owner");
            ci.activate(&owner.hash, &repo.namespace, &repo.name)
        });

        match result {
            Ok(()) => {
                debug!("successfully activated");
                report.updated += 1;
            }
            Err(e) => {
                error!("activation failed: {e}");
                report.failures.push(repo.slug.as_str(), e);
            }
        }
    }

    info!("repository activation complete");
    Ok(report)
}

/// Read-only check that each active repository's owner credential can still
/// reach the repository at the SCM provider.
pub fn preflight_activate_repos(store: &SqliteStore, scm: &dyn ScmClient) -> Result<Report> {
    let repos = active_repos(store)?;

    info!("begin repository activation preflight");

    let mut report = Report::new(repos.len());

    for repo in &repos {
        let span = debug_span!("repo", repo = %repo.slug);
        let _enter = span.enter();
        debug!("preflighting repository activation");

        let owner = find_owner(&store.connection(), repo);
        let result = owner.and_then(|owner| {
            debug!(owner = %owner.login, "check access as owner");
            let token = ScmToken::for_owner(&owner);
            Ok(scm.check_access(&token, &repo.namespace, &repo.name)?)
        });

        match result {
            Ok(()) => debug!("successfully preflighted activation"),
            Err(e) => {
                error!("preflight activation failed: {e}");
                report.failures.push(repo.slug.as_str(), e);
            }
        }
    }

    info!("repository activation preflight complete");
    Ok(report)
}

use std::fmt;

use tracing::{debug, debug_span, error, info, warn};

use super::{Report, find_owner};
use crate::auth::ScmToken;
use crate::error::Result;
use crate::remote::{RemoteRepo, ScmClient, ScmError};
use crate::store::row;
use crate::store::SqliteStore;
use crate::types::Repo;

const TEMP_REPO_QUERY: &str = r"
SELECT *
FROM repos
WHERE repo_uid LIKE 'temp\_%' ESCAPE '\'
ORDER BY repo_id
";

const UPDATE_UID_QUERY: &str = "UPDATE repos SET repo_uid = ?1 WHERE repo_id = ?2";

/// What the SCM provider says about a placeholder repository.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Found under the same namespace and name.
    Resolved(RemoteRepo),
    /// Found, but the provider reports a different namespace or name.
    Renamed(RemoteRepo),
    NotFound,
}

/// The reconciliation passes. Each reacts to a subset of resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    UpdateIdentifiers,
    RemoveRenamed,
    RemoveNotFound,
    Reconcile,
}

/// What a pass does with one resolved repository.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetUid(String),
    Remove,
    Keep,
    /// The provider could not find the repository and this pass does not
    /// remove; reported as a failure.
    Unresolved,
}

impl Pass {
    #[must_use]
    pub fn action(self, resolution: &Resolution) -> Action {
        match (self, resolution) {
            (Pass::UpdateIdentifiers | Pass::Reconcile, Resolution::Resolved(remote)) => {
                Action::SetUid(remote.id.clone())
            }
            (Pass::RemoveRenamed | Pass::Reconcile, Resolution::Renamed(_)) => Action::Remove,
            (Pass::RemoveNotFound | Pass::Reconcile, Resolution::NotFound) => Action::Remove,
            (Pass::UpdateIdentifiers | Pass::RemoveRenamed, Resolution::NotFound) => {
                Action::Unresolved
            }
            _ => Action::Keep,
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Pass::UpdateIdentifiers => "update repository identifiers",
            Pass::RemoveRenamed => "remove renamed repositories",
            Pass::RemoveNotFound => "remove not found repositories",
            Pass::Reconcile => "reconcile repositories",
        };
        f.write_str(name)
    }
}

/// Looks a placeholder repository up at the SCM provider.
///
/// Only a not-found answer becomes `Resolution::NotFound`; every other
/// provider error is returned as an error.
pub fn resolve(scm: &dyn ScmClient, token: &ScmToken, repo: &Repo) -> Result<Resolution> {
    match scm.find_repo(token, &repo.namespace, &repo.name) {
        Ok(remote) if remote.namespace == repo.namespace && remote.name == repo.name => {
            Ok(Resolution::Resolved(remote))
        }
        Ok(remote) => Ok(Resolution::Renamed(remote)),
        Err(ScmError::NotFound) => Ok(Resolution::NotFound),
        Err(e) => Err(e.into()),
    }
}

/// The credential used for a repository's lookup. An override token replaces
/// the owner lookup entirely.
fn credential(
    store: &SqliteStore,
    repo: &Repo,
    override_token: Option<&str>,
) -> Result<ScmToken> {
    if let Some(token) = override_token {
        return Ok(ScmToken::bearer(token));
    }

    let owner = find_owner(&store.connection(), repo)?;
    debug!(owner = %owner.login, "using owner credential");
    Ok(ScmToken::for_owner(&owner))
}

fn reconcile_one(
    store: &SqliteStore,
    scm: &dyn ScmClient,
    override_token: Option<&str>,
    pass: Pass,
    repo: &Repo,
    report: &mut Report,
) -> Result<()> {
    let token = credential(store, repo, override_token)?;
    let resolution = resolve(scm, &token, repo)?;

    match pass.action(&resolution) {
        Action::SetUid(uid) => {
            store
                .connection()
                .execute(UPDATE_UID_QUERY, rusqlite::params![uid, repo.id])?;
            debug!(uid = %uid, "updated metadata");
            report.updated += 1;
        }
        Action::Remove => {
            if row::delete_by_id::<Repo>(&store.connection(), repo.id)? {
                report.removed += 1;
            }
            match &resolution {
                Resolution::Renamed(remote) => {
                    debug!(renamed = %remote.slug(), "renamed repository removed");
                }
                _ => debug!("not found repository removed"),
            }
        }
        Action::Keep => {
            if let Resolution::Renamed(remote) = &resolution {
                warn!(remote = %remote.slug(), "name does not match remote, skipping");
            } else {
                debug!("skip repository");
            }
            report.skipped += 1;
        }
        Action::Unresolved => return Err(ScmError::NotFound.into()),
    }

    Ok(())
}

fn run(
    store: &SqliteStore,
    scm: &dyn ScmClient,
    override_token: Option<&str>,
    pass: Pass,
) -> Result<Report> {
    let repos: Vec<Repo> = row::query_all(&store.connection(), TEMP_REPO_QUERY, [])?;

    info!("{pass}: {} placeholder repositories", repos.len());
    if override_token.is_some() {
        info!("using an override token for every lookup");
    }

    let mut report = Report::new(repos.len());

    for repo in &repos {
        let span = debug_span!("repo", id = repo.id, repo = %repo.slug);
        let _enter = span.enter();

        if let Err(e) = reconcile_one(store, scm, override_token, pass, repo, &mut report) {
            error!("{pass} failed: {e}");
            report.failures.push(repo.slug.as_str(), e);
        }
    }

    info!("{pass} complete");
    Ok(report)
}

/// Replaces placeholder UIDs with the provider's identifiers. Renamed
/// repositories are left for `remove_renamed`.
pub fn update_repo_identifiers(
    store: &SqliteStore,
    scm: &dyn ScmClient,
    override_token: Option<&str>,
) -> Result<Report> {
    run(store, scm, override_token, Pass::UpdateIdentifiers)
}

/// Deletes placeholder repositories the provider reports under another name.
/// Their secrets go with them.
pub fn remove_renamed(
    store: &SqliteStore,
    scm: &dyn ScmClient,
    override_token: Option<&str>,
) -> Result<Report> {
    run(store, scm, override_token, Pass::RemoveRenamed)
}

/// Deletes placeholder repositories the provider cannot find. Any other
/// lookup failure is collected and the repository kept.
pub fn remove_not_found(
    store: &SqliteStore,
    scm: &dyn ScmClient,
    override_token: Option<&str>,
) -> Result<Report> {
    run(store, scm, override_token, Pass::RemoveNotFound)
}

/// Resolves, renames away and prunes placeholder repositories in one pass.
pub fn reconcile_repos(
    store: &SqliteStore,
    scm: &dyn ScmClient,
    override_token: Option<&str>,
) -> Result<Report> {
    run(store, scm, override_token, Pass::Reconcile)
}

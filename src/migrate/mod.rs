//! V0 to V1 migration.
//!
//! Entity migrators run in dependency order: users, repos, then secrets,
//! registries and logs (which all reference migrated repos). Each batch
//! migrator writes inside a single target transaction, so a failed row
//! discards the whole entity batch. The reconciliation and activation
//! passes write item by item and collect failures instead.

mod activate;
mod logs;
mod reconcile;
mod registries;
mod repos;
mod secrets;
mod upsert;
mod users;

pub use activate::{activate_repos, preflight_activate_repos};
pub use logs::{LOG_PROGRESS_INTERVAL, migrate_logs, migrate_logs_to_object_storage};
pub use reconcile::{
    Action, Pass, Resolution, reconcile_repos, remove_not_found, remove_renamed, resolve,
    update_repo_identifiers,
};
pub use registries::{aggregate_registries, migrate_registries};
pub use repos::{OwnerPatch, migrate_repos, transform_repo};
pub use secrets::{migrate_secrets, transform_secret};
pub use upsert::{Applied, HighWatermark, apply, repair_sequence};
pub use users::{dump_tokens, migrate_users, transform_user};

use rusqlite::Connection;

use crate::error::{Error, Failures, Result};
use crate::store::row::{self, Lookup};
use crate::types::{Repo, User};

/// Data is migrated only for real accounts; system and anonymous owners have ids <= 0.
#[must_use]
pub fn owned_by_user(owner_id: i64) -> bool {
    owner_id > 0
}

/// Outcome counters for one migration pass.
#[derive(Debug, Default)]
pub struct Report {
    pub total: usize,
    pub inserted: usize,
    pub updated: usize,
    pub removed: usize,
    pub skipped: usize,
    pub failures: Failures,
}

impl Report {
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, applied: Applied) {
        match applied {
            Applied::Inserted => self.inserted += 1,
            Applied::Updated => self.updated += 1,
        }
    }

    /// Turns collected item failures into an aggregate error.
    pub fn into_result(self) -> Result<Self> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(Error::Partial(self.failures))
        }
    }
}

pub(crate) fn find_owner(conn: &Connection, repo: &Repo) -> Result<User> {
    match row::find_by_id::<User>(conn, repo.user_id)? {
        Lookup::Found(user) => Ok(user),
        Lookup::NotFound => Err(Error::OwnerNotFound(repo.user_id)),
    }
}

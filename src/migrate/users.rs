use std::collections::BTreeMap;
use std::io::Write;

use chrono::Utc;
use tracing::{debug, debug_span, info};

use super::upsert::{HighWatermark, apply, repair_sequence};
use super::Report;
use crate::auth::SecretGenerator;
use crate::error::Result;
use crate::store::row::{self, Record};
use crate::store::SqliteStore;
use crate::types::{User, UserV0};

const USER_IMPORT_QUERY: &str = "
SELECT *
FROM users
WHERE user_id > 0
ORDER BY user_id
";

/// Maps a legacy account onto the V1 shape. Identity and OAuth credentials
/// carry over; operational flags reset to safe defaults.
#[must_use]
pub fn transform_user(user: &UserV0, hash: String, now: i64) -> User {
    User {
        id: user.id,
        login: user.login.clone(),
        email: user.email.clone(),
        machine: false,
        admin: false,
        active: true,
        avatar: user.avatar.clone(),
        syncing: false,
        synced: 0,
        created: now,
        updated: now,
        last_login: 0,
        token: user.token.clone(),
        refresh: user.secret.clone(),
        expiry: user.expiry,
        hash,
    }
}

/// Migrates user accounts, keeping their legacy ids.
pub fn migrate_users(source: &SqliteStore, target: &SqliteStore) -> Result<Report> {
    let users: Vec<UserV0> = row::query_all(&source.connection(), USER_IMPORT_QUERY, [])?;

    info!("migrating {} users", users.len());

    let generator = SecretGenerator::new();
    let now = Utc::now().timestamp();

    let report = target.transaction(|tx| {
        let mut report = Report::new(users.len());
        let mut sequence = HighWatermark::default();

        for user in &users {
            sequence.observe(user.id);

            let span = debug_span!("user", id = user.id, login = %user.login);
            let _enter = span.enter();
            debug!("migrate user");

            let record = transform_user(user, generator.user_hash(), now);
            report.record(apply(tx, &record)?);

            debug!("migration complete");
        }

        repair_sequence(tx, User::TABLE, sequence.value())?;
        Ok(report)
    })?;

    info!("migration complete");
    Ok(report)
}

/// Writes the legacy login to hash mapping as a flat JSON object.
pub fn dump_tokens<W: Write>(source: &SqliteStore, mut w: W) -> Result<()> {
    let users: Vec<UserV0> = row::query_all(&source.connection(), USER_IMPORT_QUERY, [])?;

    let tokens: BTreeMap<&str, &str> = users
        .iter()
        .map(|user| (user.login.as_str(), user.hash.as_str()))
        .collect();

    serde_json::to_writer_pretty(&mut w, &tokens)?;
    writeln!(w)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy_user() -> UserV0 {
        UserV0 {
            id: 42,
            login: "octocat".to_string(),
            token: "oauth-token".to_string(),
            secret: "oauth-refresh".to_string(),
            expiry: 1_700_000_000,
            email: "octocat@example.com".to_string(),
            avatar: "https://avatars.example.com/octocat".to_string(),
            active: false,
            admin: true,
            hash: "legacy-hash".to_string(),
            synced: 99,
        }
    }

    #[test]
    fn test_transform_preserves_identity_and_resets_flags() {
        let user = transform_user(&legacy_user(), "fresh-hash".to_string(), 1234);

        assert_eq!(user.id, 42);
        assert_eq!(user.login, "octocat");
        assert_eq!(user.email, "octocat@example.com");
        assert_eq!(user.token, "oauth-token");
        assert_eq!(user.refresh, "oauth-refresh");
        assert_eq!(user.expiry, 1_700_000_000);
        assert_eq!(user.hash, "fresh-hash");

        assert!(!user.admin);
        assert!(!user.machine);
        assert!(user.active);
        assert!(!user.syncing);
        assert_eq!(user.synced, 0);
        assert_eq!(user.last_login, 0);
        assert_eq!(user.created, 1234);
    }
}

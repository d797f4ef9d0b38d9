use chrono::{DateTime, Utc};
use tracing::warn;

use crate::types::User;

/// Credential presented to the SCM provider on behalf of a repository owner.
#[derive(Debug, Clone, PartialEq)]
pub struct ScmToken {
    pub token: String,
    pub refresh: String,
    pub expires: Option<DateTime<Utc>>,
}

impl ScmToken {
    /// An operator-supplied token with no refresh or expiry.
    #[must_use]
    pub fn bearer(token: &str) -> Self {
        Self {
            token: token.to_string(),
            refresh: String::new(),
            expires: None,
        }
    }

    /// The owner's stored OAuth credential. An expiry of 0 means none.
    #[must_use]
    pub fn from_user(user: &User) -> Self {
        let expires = if user.expiry > 0 {
            DateTime::from_timestamp(user.expiry, 0)
        } else {
            None
        };
        Self {
            token: user.token.clone(),
            refresh: user.refresh.clone(),
            expires,
        }
    }

    /// The owner's credential for a remote call. Expired tokens are logged
    /// and still presented.
    #[must_use]
    pub fn for_owner(user: &User) -> Self {
        let token = Self::from_user(user);
        if token.is_expired() {
            warn!(
                owner = %user.login,
                expired = ?token.expires,
                has_refresh = !token.refresh.is_empty(),
                "owner token expired, lookups may be rejected"
            );
        }
        token
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires.is_some_and(|expires| expires <= Utc::now())
    }
}

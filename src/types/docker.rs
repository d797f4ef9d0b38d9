use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Docker credential-store document (`config.json` format).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DockerConfig {
    pub auths: BTreeMap<String, AuthConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    pub auth: String,
}

impl AuthConfig {
    #[must_use]
    pub fn new(username: &str, password: &str, email: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            email: email.to_string(),
            auth: STANDARD.encode(format!("{username}:{password}")),
        }
    }
}

impl DockerConfig {
    /// Adds or replaces the credentials for one registry address.
    pub fn insert(&mut self, address: &str, auth: AuthConfig) {
        self.auths.insert(address.to_string(), auth);
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

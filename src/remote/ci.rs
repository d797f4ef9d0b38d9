use reqwest::blocking::Client;

use super::{http_client, repo_path};
use crate::error::{Error, Result};

/// The CI server's activation API, which registers repository webhooks.
pub trait CiClient {
    fn activate(&self, token: &str, namespace: &str, name: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct CiApiClient {
    client: Client,
    server_url: String,
}

impl CiApiClient {
    pub fn new(server_url: &str) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            server_url: server_url.trim_end_matches('/').to_string(),
        })
    }
}

impl CiClient for CiApiClient {
    fn activate(&self, token: &str, namespace: &str, name: &str) -> Result<()> {
        let url = format!("{}/api/repos/{}", self.server_url, repo_path(namespace, name));
        let resp = self.client.post(&url).bearer_auth(token).send()?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Error::Remote {
                status: resp.status().as_u16(),
                message: resp
                    .text()
                    .unwrap_or_else(|_| "Server error (no details provided)".into()),
            })
        }
    }
}

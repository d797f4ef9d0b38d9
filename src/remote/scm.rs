use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use thiserror::Error;

use super::{http_client, repo_path};
use crate::auth::ScmToken;
use crate::error::Result;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Error)]
pub enum ScmError {
    #[error("repository not found")]
    NotFound,
    #[error("unauthorized")]
    Unauthorized,
    #[error("unexpected status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// A repository as the SCM provider reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRepo {
    pub id: String,
    pub namespace: String,
    pub name: String,
}

impl RemoteRepo {
    #[must_use]
    pub fn slug(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

/// The source-control provider that owns the canonical repository identifiers.
pub trait ScmClient {
    /// Looks a repository up by namespace and name.
    fn find_repo(
        &self,
        token: &ScmToken,
        namespace: &str,
        name: &str,
    ) -> std::result::Result<RemoteRepo, ScmError>;

    /// Read-only check that the credential can reach the repository.
    fn check_access(
        &self,
        token: &ScmToken,
        namespace: &str,
        name: &str,
    ) -> std::result::Result<(), ScmError> {
        self.find_repo(token, namespace, name).map(|_| ())
    }
}

#[derive(Debug, Deserialize)]
struct GithubOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GithubRepo {
    id: i64,
    name: String,
    owner: GithubOwner,
}

/// GitHub REST client.
#[derive(Clone)]
pub struct GithubClient {
    client: Client,
    api_url: String,
}

impl GithubClient {
    pub fn new(api_url: &str) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    fn get(
        &self,
        token: &ScmToken,
        path: &str,
    ) -> std::result::Result<reqwest::blocking::Response, ScmError> {
        let url = format!("{}{}", self.api_url, path);
        Ok(self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .bearer_auth(&token.token)
            .send()?)
    }
}

fn status_error(resp: reqwest::blocking::Response) -> ScmError {
    let status = resp.status();
    match status {
        StatusCode::NOT_FOUND => ScmError::NotFound,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ScmError::Unauthorized,
        _ => ScmError::Status {
            status: status.as_u16(),
            message: resp.text().unwrap_or_default(),
        },
    }
}

impl ScmClient for GithubClient {
    fn find_repo(
        &self,
        token: &ScmToken,
        namespace: &str,
        name: &str,
    ) -> std::result::Result<RemoteRepo, ScmError> {
        let resp = self.get(token, &format!("/repos/{}", repo_path(namespace, name)))?;
        if !resp.status().is_success() {
            return Err(status_error(resp));
        }

        let repo: GithubRepo = resp.json()?;
        Ok(RemoteRepo {
            id: repo.id.to_string(),
            namespace: repo.owner.login,
            name: repo.name,
        })
    }

    fn check_access(
        &self,
        token: &ScmToken,
        namespace: &str,
        name: &str,
    ) -> std::result::Result<(), ScmError> {
        let resp = self.get(
            token,
            &format!("/repos/{}/readme", repo_path(namespace, name)),
        )?;
        // A repository without a readme is still reachable.
        if resp.status().is_success() || resp.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(status_error(resp))
    }
}

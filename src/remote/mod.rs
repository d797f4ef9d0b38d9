mod ci;
mod scm;

pub use ci::{CiApiClient, CiClient};
pub use scm::{DEFAULT_API_URL, GithubClient, RemoteRepo, ScmClient, ScmError};

use std::time::Duration;

use reqwest::blocking::Client;

pub(crate) const USER_AGENT: &str = concat!("ci-migrate/", env!("CARGO_PKG_VERSION"));

pub(crate) fn http_client() -> reqwest::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(USER_AGENT)
        .build()
}

/// Joins a namespace and name into an API path, encoding each segment.
pub(crate) fn repo_path(namespace: &str, name: &str) -> String {
    format!(
        "{}/{}",
        urlencoding::encode(namespace),
        urlencoding::encode(name)
    )
}

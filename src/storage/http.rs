use reqwest::blocking::Client;

use super::{ObjectStore, StorageError};
use crate::remote::http_client;

/// S3-compatible object storage reached with plain `PUT` requests.
#[derive(Clone)]
pub struct HttpObjectStore {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpObjectStore {
    pub fn new(endpoint: &str, token: Option<String>) -> Result<Self, StorageError> {
        Ok(Self {
            client: http_client()?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token,
        })
    }

    #[must_use]
    pub fn object_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint,
            bucket.trim_matches('/'),
            key.trim_start_matches('/')
        )
    }
}

impl ObjectStore for HttpObjectStore {
    fn put(&self, bucket: &str, key: &str, data: &[u8], private: bool) -> Result<(), StorageError> {
        let mut req = self
            .client
            .put(self.object_url(bucket, key))
            .header("Content-Type", "application/octet-stream")
            .body(data.to_vec());
        if private {
            req = req.header("x-amz-acl", "private");
        }
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req.send()?;
        if resp.status().is_success() {
            return Ok(());
        }
        Err(StorageError::Rejected {
            status: resp.status().as_u16(),
            message: resp.text().unwrap_or_default(),
        })
    }
}

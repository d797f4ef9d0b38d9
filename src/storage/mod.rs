mod fs;
mod http;
mod key;

pub use fs::FsObjectStore;
pub use http::HttpObjectStore;
pub use key::object_key;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid object key: {0}")]
    InvalidKey(String),
    #[error("upload rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Destination for bulk log bodies.
pub trait ObjectStore {
    /// Stores `data` under `key` in `bucket`. `private` objects must not be publicly readable.
    fn put(&self, bucket: &str, key: &str, data: &[u8], private: bool) -> Result<(), StorageError>;
}

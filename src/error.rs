use std::fmt;

use thiserror::Error;

use crate::remote::ScmError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("not found")]
    NotFound,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("scm error: {0}")]
    Scm(#[from] ScmError),

    #[error("object storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("owner {0} of repository not found")]
    OwnerNotFound(i64),

    #[error("record for table {0} has no primary key")]
    MissingPrimaryKey(&'static str),

    #[error("{0}")]
    Partial(Failures),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A single item that failed during a collect-and-continue pass.
#[derive(Debug)]
pub struct ItemFailure {
    pub item: String,
    pub error: Error,
}

/// Every failure collected during one pass, reported together at the end.
#[derive(Debug, Default)]
pub struct Failures(pub Vec<ItemFailure>);

impl Failures {
    pub fn push(&mut self, item: impl Into<String>, error: Error) {
        self.0.push(ItemFailure {
            item: item.into(),
            error,
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemFailure> {
        self.0.iter()
    }
}

impl fmt::Display for Failures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} item(s) failed", self.0.len())?;
        for failure in &self.0 {
            write!(f, "\n  {}: {}", failure.item, failure.error)?;
        }
        Ok(())
    }
}

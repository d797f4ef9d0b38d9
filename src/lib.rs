//! # ci-migrate
//!
//! Migrates a legacy CI datastore (V0) into the current schema (V1), usable
//! both as a standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! ci-migrate = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use ci_migrate::migrate::{OwnerPatch, migrate_repos, migrate_users};
//! use ci_migrate::store::SqliteStore;
//!
//! let source = SqliteStore::new("legacy.sqlite")?;
//! let target = SqliteStore::new("current.sqlite")?;
//! target.initialize()?;
//!
//! migrate_users(&source, &target)?;
//! migrate_repos(&source, &target, &OwnerPatch::defaults())?;
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `ci-migrate` binary. Disable with `default-features = false`.

pub mod auth;
pub mod config;
pub mod error;
pub mod migrate;
pub mod remote;
pub mod storage;
pub mod store;
pub mod types;

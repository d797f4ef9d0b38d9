mod mapping;
pub mod row;
mod schema;
mod sqlite;

pub use row::{FromRow, Lookup, Record};
pub use schema::{LEGACY_SCHEMA, SCHEMA};
pub use sqlite::SqliteStore;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, Transaction};

use super::schema::{LEGACY_SCHEMA, SCHEMA};
use crate::error::Result;

/// A SQLite datastore, used for both the legacy source and the migration target.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// Statements run through it outside `transaction` commit immediately.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }

    /// Creates the current (V1) schema.
    pub fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Creates the legacy (V0) schema.
    pub fn initialize_legacy(&self) -> Result<()> {
        self.conn().execute_batch(LEGACY_SCHEMA)?;
        Ok(())
    }

    /// Runs `f` inside a single transaction. Commits when `f` succeeds; any
    /// error (or panic) rolls back everything `f` wrote.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

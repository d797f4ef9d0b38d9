use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, error, info};

use crate::error::Result;
use crate::store::row::{self, Lookup, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Inserted,
    Updated,
}

/// Inserts `record`, or updates the mutable columns of the row already stored
/// under its primary key. Applying the same record twice leaves one row.
///
/// A record without a primary key is always inserted with a store-assigned key.
pub fn apply<T: Record>(conn: &Connection, record: &T) -> Result<Applied> {
    let Some(id) = record.id() else {
        row::insert(conn, record)
            .inspect_err(|e| error!("failed to insert new {}: {e}", T::TABLE))?;
        return Ok(Applied::Inserted);
    };

    let existing = row::find_by_id::<T>(conn, id)
        .inspect_err(|e| error!("error querying for existing {} {id}: {e}", T::TABLE))?;

    match existing {
        Lookup::NotFound => {
            debug!("inserting new {} {}", T::TABLE, id);
            row::insert(conn, record)
                .inspect_err(|e| error!("failed to insert new {} {id}: {e}", T::TABLE))?;
            Ok(Applied::Inserted)
        }
        Lookup::Found(_) => {
            debug!("updating existing {} {}", T::TABLE, id);
            row::update(conn, record)
                .inspect_err(|e| error!("failed to update existing {} {id}: {e}", T::TABLE))?;
            Ok(Applied::Updated)
        }
    }
}

/// Highest explicit primary key written during a batch.
#[derive(Debug, Default, Clone, Copy)]
pub struct HighWatermark(i64);

impl HighWatermark {
    pub fn observe(&mut self, id: i64) {
        self.0 = self.0.max(id);
    }

    #[must_use]
    pub fn value(&self) -> i64 {
        self.0
    }
}

/// Advances `table`'s sequence so the next store-assigned key is greater than
/// `high_watermark`. Never moves a sequence backwards.
///
/// Only AUTOINCREMENT tables keep a sequence object; for any other table this
/// is a no-op and returns `false`.
pub fn repair_sequence(conn: &Connection, table: &str, high_watermark: i64) -> Result<bool> {
    if high_watermark <= 0 {
        return Ok(false);
    }

    if !uses_sequence(conn, table)? {
        debug!("{} assigns keys per row, no sequence to repair", table);
        return Ok(false);
    }

    let raised = conn
        .execute(
            "UPDATE sqlite_sequence SET seq = ?2 WHERE name = ?1 AND seq < ?2",
            params![table, high_watermark],
        )
        .inspect_err(|e| error!("failed to reset sequence for {table}: {e}"))?;
    if raised == 0 {
        conn.execute(
            "INSERT INTO sqlite_sequence (name, seq)
             SELECT ?1, ?2 WHERE NOT EXISTS (SELECT 1 FROM sqlite_sequence WHERE name = ?1)",
            params![table, high_watermark],
        )
        .inspect_err(|e| error!("failed to reset sequence for {table}: {e}"))?;
    }

    info!("sequence for {} restarts after {}", table, high_watermark);
    Ok(true)
}

fn uses_sequence(conn: &Connection, table: &str) -> Result<bool> {
    let sql: Option<String> = conn
        .query_row(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )
        .optional()?;

    Ok(sql.is_some_and(|sql| sql.to_ascii_uppercase().contains("AUTOINCREMENT")))
}

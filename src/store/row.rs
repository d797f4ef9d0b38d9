//! Generic mapping between relational rows and typed records.

use rusqlite::types::Value;
use rusqlite::{Connection, Params, Row, params_from_iter};

use crate::error::{Error, Result};

/// Builds a typed record from a row, reading columns by name.
pub trait FromRow: Sized {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// A record that can be written to a target table.
///
/// `COLUMNS` lists every data column except the primary key, in the same
/// order as `values()`.
pub trait Record: FromRow {
    const TABLE: &'static str;
    const PRIMARY_KEY: &'static str;
    const COLUMNS: &'static [&'static str];
    /// Columns left untouched when an existing row is updated.
    const IMMUTABLE: &'static [&'static str] = &[];

    /// The explicit primary key, or `None` to let the store assign one.
    fn id(&self) -> Option<i64>;

    fn values(&self) -> Vec<Value>;
}

/// Outcome of a single-row query. A missing row is an expected result, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound => None,
        }
    }
}

pub fn query_all<T: FromRow, P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, T::from_row)?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

pub fn query_one<T: FromRow, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Lookup<T>> {
    match conn.query_row(sql, params, T::from_row) {
        Ok(record) => Ok(Lookup::Found(record)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(Lookup::NotFound),
        Err(e) => Err(Error::from(e)),
    }
}

pub fn find_by_id<T: Record>(conn: &Connection, id: i64) -> Result<Lookup<T>> {
    let sql = format!(
        "SELECT * FROM {} WHERE {} = ?1",
        T::TABLE,
        T::PRIMARY_KEY
    );
    query_one(conn, &sql, [id])
}

/// Inserts a record and returns its primary key.
pub fn insert<T: Record>(conn: &Connection, record: &T) -> Result<i64> {
    let mut columns: Vec<&str> = Vec::with_capacity(T::COLUMNS.len() + 1);
    let mut values: Vec<Value> = Vec::with_capacity(T::COLUMNS.len() + 1);

    if let Some(id) = record.id() {
        columns.push(T::PRIMARY_KEY);
        values.push(Value::Integer(id));
    }
    columns.extend_from_slice(T::COLUMNS);
    values.extend(record.values());

    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        T::TABLE,
        columns.join(", "),
        placeholders
    );

    conn.execute(&sql, params_from_iter(values))?;
    Ok(record.id().unwrap_or_else(|| conn.last_insert_rowid()))
}

/// Updates the mutable columns of an existing row.
pub fn update<T: Record>(conn: &Connection, record: &T) -> Result<()> {
    let id = record.id().ok_or(Error::MissingPrimaryKey(T::TABLE))?;

    let mut assignments = Vec::with_capacity(T::COLUMNS.len());
    let mut values: Vec<Value> = Vec::with_capacity(T::COLUMNS.len() + 1);
    for (column, value) in T::COLUMNS.iter().zip(record.values()) {
        if T::IMMUTABLE.contains(column) {
            continue;
        }
        values.push(value);
        assignments.push(format!("{column} = ?{}", values.len()));
    }
    values.push(Value::Integer(id));

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?{}",
        T::TABLE,
        assignments.join(", "),
        T::PRIMARY_KEY,
        values.len()
    );

    let rows = conn.execute(&sql, params_from_iter(values))?;
    if rows == 0 {
        return Err(Error::NotFound);
    }
    Ok(())
}

pub fn delete_by_id<T: Record>(conn: &Connection, id: i64) -> Result<bool> {
    let sql = format!("DELETE FROM {} WHERE {} = ?1", T::TABLE, T::PRIMARY_KEY);
    let rows = conn.execute(&sql, [id])?;
    Ok(rows > 0)
}

/// Reads a text column that legacy rows may have left NULL.
pub(crate) fn text(row: &Row<'_>, column: &str) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(column)?.unwrap_or_default())
}

pub(crate) fn int(row: &Row<'_>, column: &str) -> rusqlite::Result<i64> {
    Ok(row.get::<_, Option<i64>>(column)?.unwrap_or_default())
}

pub(crate) fn flag(row: &Row<'_>, column: &str) -> rusqlite::Result<bool> {
    Ok(int(row, column)? != 0)
}

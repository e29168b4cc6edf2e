//! SQLite store implementation - modular structure
//!
//! All methods are synchronous; every public operation is a single statement
//! or an explicit transaction, so readers always see complete records.

// SQLite uses i64 for counts/limits, Rust uses usize - safe conversions within DB context
#![allow(
    clippy::as_conversions,
    clippy::cast_possible_wrap,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "SQLite i64 <-> Rust usize conversions are safe within DB row counts"
)]

mod observations;
mod sessions;
mod stats;
mod updates;

use chronicle_core::{ChronicleError, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;

use crate::migrations;

pub(crate) type PooledConn = PooledConnection<SqliteConnectionManager>;

/// The observation store: the single persistence boundary for the project.
///
/// Cloning shares the underlying pool.
#[derive(Clone, Debug)]
pub struct Store {
    pub(crate) pool: Pool<SqliteConnectionManager>,
}

/// Log row read errors and filter them out: one bad row must never abort a
/// whole read.
pub(crate) fn log_row_error<T>(result: rusqlite::Result<T>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!("Row read error: {}", e);
            None
        },
    }
}

/// Parse JSON from a column, converting the error to a rusqlite error.
pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(s: &str) -> rusqlite::Result<T> {
    serde_json::from_str(s).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

/// Parse an RFC 3339 column into a UTC timestamp.
pub(crate) fn parse_timestamp(s: &str) -> rusqlite::Result<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&chrono::Utc))
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

/// Escape special characters for LIKE pattern matching
pub(crate) fn escape_like_pattern(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

/// Connection initializer: concurrency settings for multi-process writers.
fn init_connection(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA busy_timeout = 30000;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;
    Ok(())
}

fn db_pool_size() -> u32 {
    chronicle_core::env_parse_with_default("CHRONICLE_DB_POOL_SIZE", 8)
}

impl Store {
    /// Open (or create) the store at `db_path` and bring the schema up to
    /// date.
    pub fn open(db_path: &Path) -> Result<Self> {
        let manager = SqliteConnectionManager::file(db_path).with_init(init_connection);

        let pool_size = db_pool_size();
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(ChronicleError::persistence)?;

        let conn = pool.get().map_err(ChronicleError::persistence)?;
        migrations::run_migrations(&conn).map_err(ChronicleError::persistence)?;
        drop(conn);

        tracing::info!(pool_size = pool_size, path = %db_path.display(), "store opened");

        Ok(Self { pool })
    }

    /// Run `f` against a pooled connection, mapping driver errors to the
    /// persistence variant at this single boundary.
    pub(crate) fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T> {
        let conn: PooledConn = self.pool.get().map_err(ChronicleError::persistence)?;
        f(&conn).map_err(ChronicleError::persistence)
    }
}

use chronicle_core::{ChronicleError, Result, Session};
use chrono::Utc;
use rusqlite::params;

use super::{Store, parse_timestamp};

impl Store {
    /// Start a session in `context`, implicitly ending any session still
    /// active in the same context.
    ///
    /// # Errors
    /// `Validation` for an empty context, `Persistence` on storage failure.
    pub fn begin_session(&self, context: &str) -> Result<i64> {
        if context.trim().is_empty() {
            return Err(ChronicleError::validation("context must not be empty"));
        }
        let now = Utc::now().to_rfc3339();
        self.with_conn(|conn| {
            let closed = conn.execute(
                "UPDATE sessions SET ended_at = ?1 WHERE context = ?2 AND ended_at IS NULL",
                params![now, context],
            )?;
            if closed > 0 {
                tracing::info!(context, closed, "implicitly ended previous session(s)");
            }
            conn.execute(
                "INSERT INTO sessions (context, started_at) VALUES (?1, ?2)",
                params![context, now],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Explicitly end a session. Ending an already-ended session is a no-op.
    ///
    /// # Errors
    /// `NotFound` for an unknown id.
    pub fn end_session(&self, id: i64) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.with_conn(|conn| {
            conn.execute(
                "UPDATE sessions SET ended_at = ?1 WHERE id = ?2 AND ended_at IS NULL",
                params![now, id],
            )
        })?;
        if updated == 0 {
            // Distinguish "already ended" from "never existed".
            let _ = self.get_session(id)?;
        }
        Ok(())
    }

    /// Get one session by id.
    ///
    /// # Errors
    /// `NotFound` for an unknown id.
    pub fn get_session(&self, id: i64) -> Result<Session> {
        let found = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, context, started_at, ended_at FROM sessions WHERE id = ?1",
            )?;
            let mut rows = stmt.query(params![id])?;
            match rows.next()? {
                Some(row) => Ok(Some(Self::row_to_session(row)?)),
                None => Ok(None),
            }
        })?;
        found.ok_or_else(|| ChronicleError::not_found(format!("session {id}")))
    }

    /// The currently active session in `context`, if any.
    ///
    /// # Errors
    /// `Persistence` on storage failure.
    pub fn active_session(&self, context: &str) -> Result<Option<Session>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, context, started_at, ended_at FROM sessions
                 WHERE context = ?1 AND ended_at IS NULL ORDER BY id DESC LIMIT 1",
            )?;
            let mut rows = stmt.query(params![context])?;
            match rows.next()? {
                Some(row) => Ok(Some(Self::row_to_session(row)?)),
                None => Ok(None),
            }
        })
    }

    fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
        let ended_at: Option<String> = row.get(3)?;
        Ok(Session {
            id: row.get(0)?,
            context: row.get(1)?,
            started_at: parse_timestamp(&row.get::<_, String>(2)?)?,
            ended_at: ended_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

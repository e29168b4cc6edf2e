//! Gate bookkeeping: the applied-fragment ledger and the review queue.

use std::str::FromStr as _;

use chronicle_core::{ChronicleError, PatternKind, QueuedUpdate, Result, Update, UpdateStatus};
use chrono::Utc;
use rusqlite::params;

use super::{Store, log_row_error, parse_json, parse_timestamp};

impl Store {
    /// Record that a fragment fingerprint has been applied to a document.
    ///
    /// # Errors
    /// `Persistence` on storage failure.
    pub fn record_applied(&self, fingerprint: &str, target_document: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO applied_fragments (fingerprint, target_document, applied_at)
                 VALUES (?1, ?2, ?3)",
                params![fingerprint, target_document, now],
            )?;
            Ok(())
        })
    }

    /// Whether a fragment fingerprint was already applied.
    ///
    /// # Errors
    /// `Persistence` on storage failure.
    pub fn is_applied(&self, fingerprint: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM applied_fragments WHERE fingerprint = ?1",
                params![fingerprint],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    /// Persist a below-threshold update for human review and return its
    /// queue id.
    ///
    /// # Errors
    /// `Persistence` on storage failure.
    pub fn enqueue_update(&self, update: &Update) -> Result<i64> {
        let evidence = serde_json::to_string(&update.evidence)?;
        let now = Utc::now().to_rfc3339();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO update_queue
                   (pattern_kind, target_document, fragment, confidence, evidence, status, reason, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6, ?7)",
                params![
                    update.pattern_kind.as_str(),
                    update.target_document,
                    update.fragment,
                    update.confidence,
                    evidence,
                    update.reason,
                    now,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// All updates still waiting for review, oldest first.
    ///
    /// # Errors
    /// `Persistence` on storage failure.
    pub fn queued_updates(&self) -> Result<Vec<QueuedUpdate>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, pattern_kind, target_document, fragment, confidence, evidence, created_at
                 FROM update_queue WHERE status = 'pending' ORDER BY id",
            )?;
            let rows = stmt
                .query_map([], Self::row_to_queued_update)?
                .filter_map(log_row_error)
                .collect();
            Ok(rows)
        })
    }

    /// Get one queued update by queue id.
    ///
    /// # Errors
    /// `NotFound` if the id does not exist or was already resolved.
    pub fn get_queued(&self, id: i64) -> Result<QueuedUpdate> {
        let found = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, pattern_kind, target_document, fragment, confidence, evidence, created_at
                 FROM update_queue WHERE id = ?1 AND status = 'pending'",
            )?;
            let mut rows = stmt.query(params![id])?;
            match rows.next()? {
                Some(row) => Ok(Some(Self::row_to_queued_update(row)?)),
                None => Ok(None),
            }
        })?;
        found.ok_or_else(|| ChronicleError::not_found(format!("queued update {id}")))
    }

    /// Mark a queued update applied or rejected. Terminal; resolved rows are
    /// never re-queued.
    ///
    /// # Errors
    /// `NotFound` if the id does not exist or was already resolved,
    /// `Validation` if `status` is not terminal.
    pub fn resolve_queued(
        &self,
        id: i64,
        status: UpdateStatus,
        reason: Option<&str>,
    ) -> Result<()> {
        if status == UpdateStatus::Queued {
            return Err(ChronicleError::validation(
                "queued is not a terminal resolution",
            ));
        }
        let now = Utc::now().to_rfc3339();
        let updated = self.with_conn(|conn| {
            conn.execute(
                "UPDATE update_queue SET status = ?1, reason = ?2, resolved_at = ?3
                 WHERE id = ?4 AND status = 'pending'",
                params![status.as_str(), reason, now, id],
            )
        })?;
        if updated == 0 {
            return Err(ChronicleError::not_found(format!("queued update {id}")));
        }
        Ok(())
    }

    fn row_to_queued_update(row: &rusqlite::Row<'_>) -> rusqlite::Result<QueuedUpdate> {
        let kind_str: String = row.get(1)?;
        let pattern_kind = PatternKind::from_str(&kind_str)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        Ok(QueuedUpdate {
            id: row.get(0)?,
            pattern_kind,
            target_document: row.get(2)?,
            fragment: row.get(3)?,
            confidence: row.get(4)?,
            evidence: parse_json(&row.get::<_, String>(5)?)?,
            created_at: parse_timestamp(&row.get::<_, String>(6)?)?,
        })
    }
}

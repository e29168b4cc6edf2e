use std::str::FromStr as _;

use chronicle_core::{
    ChronicleError, MAX_QUERY_LIMIT, Observation, ObservationDraft, ObservationKind, QueryFilter,
    Result,
};
use chrono::Utc;
use rusqlite::params;

use super::{Store, escape_like_pattern, log_row_error, parse_json, parse_timestamp};

impl Store {
    /// Append a new observation and return its id.
    ///
    /// The insert is durable before this returns; callers may treat the
    /// returned id as a durability acknowledgment.
    ///
    /// # Errors
    /// `Validation` if the summary is empty, `Persistence` on storage
    /// failure.
    pub fn capture(&self, draft: &ObservationDraft) -> Result<i64> {
        if draft.summary.trim().is_empty() {
            return Err(ChronicleError::validation("summary must not be empty"));
        }
        if draft.context.trim().is_empty() {
            return Err(ChronicleError::validation("context must not be empty"));
        }

        let related_paths = serde_json::to_string(&draft.related_paths)?;
        let timestamp = Utc::now().to_rfc3339();

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO observations (timestamp, context, kind, summary, detail, related_paths, session_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    timestamp,
                    draft.context,
                    draft.kind.as_str(),
                    draft.summary,
                    draft.detail,
                    related_paths,
                    draft.session_id,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Get one observation by id.
    ///
    /// # Errors
    /// `NotFound` if no such id exists.
    pub fn get(&self, id: i64) -> Result<Observation> {
        let found = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, timestamp, context, kind, summary, detail, related_paths, session_id
                 FROM observations WHERE id = ?1",
            )?;
            let mut rows = stmt.query(params![id])?;
            match rows.next()? {
                Some(row) => Ok(Some(Self::row_to_observation(row)?)),
                None => Ok(None),
            }
        })?;
        found.ok_or_else(|| ChronicleError::not_found(format!("observation {id}")))
    }

    /// Query observations, most recent first (descending id, the canonical
    /// recency order). The text filter is a case-insensitive substring match
    /// over summary and detail.
    ///
    /// # Errors
    /// `Persistence` on storage failure.
    pub fn query(&self, filter: &QueryFilter, limit: usize) -> Result<Vec<Observation>> {
        let limit = limit.min(MAX_QUERY_LIMIT) as i64;

        let (mut sql, mut args) = filter_sql(filter);
        sql.push_str(" ORDER BY id DESC LIMIT ?");
        args.push(Box::new(limit));

        self.select_observations(&sql, &args)
    }

    /// Every observation matching `filter`, in capture order (ascending id),
    /// with no result cap.
    ///
    /// One statement, so the result is a consistent snapshot. Batch
    /// consumers (the miner) use this instead of `query`: a capped fetch
    /// would silently drop the oldest records of a busy window and
    /// undercount the very patterns it is looking for.
    ///
    /// # Errors
    /// `Persistence` on storage failure.
    pub fn scan(&self, filter: &QueryFilter) -> Result<Vec<Observation>> {
        let (mut sql, args) = filter_sql(filter);
        sql.push_str(" ORDER BY id");

        self.select_observations(&sql, &args)
    }

    fn select_observations(
        &self,
        sql: &str,
        args: &[Box<dyn rusqlite::ToSql>],
    ) -> Result<Vec<Observation>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let params: Vec<&dyn rusqlite::ToSql> = args.iter().map(AsRef::as_ref).collect();
            let results = stmt
                .query_map(params.as_slice(), Self::row_to_observation)?
                .filter_map(log_row_error)
                .collect();
            Ok(results)
        })
    }

    /// Ids of the observations nearest in time to `obs` that share one of
    /// its related paths or its context.
    ///
    /// Recomputed on every call; relationships are never persisted.
    ///
    /// # Errors
    /// `Persistence` on storage failure.
    pub fn nearest_related(&self, obs: &Observation, limit: usize) -> Result<Vec<i64>> {
        let mut sql = String::from(
            "SELECT id FROM observations WHERE id != ? AND (context = ?",
        );
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = vec![
            Box::new(obs.id),
            Box::new(obs.context.clone()),
        ];

        for path in &obs.related_paths {
            sql.push_str(r" OR related_paths LIKE ? ESCAPE '\'");
            // Paths are stored JSON-encoded, so match the quoted form.
            args.push(Box::new(format!("%\"{}\"%", escape_like_pattern(path))));
        }
        sql.push_str(
            ") ORDER BY ABS(strftime('%s', timestamp) - strftime('%s', ?)), id LIMIT ?",
        );
        args.push(Box::new(obs.timestamp.to_rfc3339()));
        args.push(Box::new(limit.min(MAX_QUERY_LIMIT) as i64));

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::ToSql> = args.iter().map(AsRef::as_ref).collect();
            let ids = stmt
                .query_map(params.as_slice(), |row| row.get(0))?
                .filter_map(log_row_error)
                .collect();
            Ok(ids)
        })
    }

    pub(crate) fn row_to_observation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Observation> {
        let kind_str: String = row.get(3)?;
        let kind = ObservationKind::from_str(&kind_str)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        Ok(Observation {
            id: row.get(0)?,
            timestamp: parse_timestamp(&row.get::<_, String>(1)?)?,
            context: row.get(2)?,
            kind,
            summary: row.get(4)?,
            detail: row.get(5)?,
            related_paths: parse_json(&row.get::<_, String>(6)?)?,
            session_id: row.get(7)?,
        })
    }
}

/// WHERE clauses and bound arguments shared by `query` and `scan`.
fn filter_sql(filter: &QueryFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
    let mut sql = String::from(
        "SELECT id, timestamp, context, kind, summary, detail, related_paths, session_id
         FROM observations WHERE 1=1",
    );
    let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(ref context) = filter.context {
        sql.push_str(" AND context = ?");
        args.push(Box::new(context.clone()));
    }
    if let Some(kind) = filter.kind {
        sql.push_str(" AND kind = ?");
        args.push(Box::new(kind.as_str()));
    }
    if let Some(since) = filter.since {
        sql.push_str(" AND timestamp >= ?");
        args.push(Box::new(since.to_rfc3339()));
    }
    if let Some(until) = filter.until {
        sql.push_str(" AND timestamp <= ?");
        args.push(Box::new(until.to_rfc3339()));
    }
    if let Some(ref text) = filter.text {
        sql.push_str(r" AND (summary LIKE ? ESCAPE '\' OR detail LIKE ? ESCAPE '\')");
        let pattern = format!("%{}%", escape_like_pattern(text));
        args.push(Box::new(pattern.clone()));
        args.push(Box::new(pattern));
    }

    (sql, args)
}

use chronicle_core::{Result, StoreStats};

use super::{Store, log_row_error, parse_timestamp};

impl Store {
    /// Store-level statistics: counts, per-context and per-kind breakdowns,
    /// timestamp range, size on disk.
    ///
    /// # Errors
    /// `Persistence` on storage failure.
    pub fn stats(&self) -> Result<StoreStats> {
        self.with_conn(|conn| {
            let total: i64 =
                conn.query_row("SELECT COUNT(*) FROM observations", [], |row| row.get(0))?;

            let mut stmt = conn.prepare(
                "SELECT context, COUNT(*) FROM observations GROUP BY context ORDER BY context",
            )?;
            let by_context: Vec<(String, u64)> = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as u64)))?
                .filter_map(log_row_error)
                .collect();

            let mut stmt = conn
                .prepare("SELECT kind, COUNT(*) FROM observations GROUP BY kind ORDER BY kind")?;
            let by_kind: Vec<(String, u64)> = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as u64)))?
                .filter_map(log_row_error)
                .collect();

            let date_range = if total > 0 {
                let (min, max): (String, String) = conn.query_row(
                    "SELECT MIN(timestamp), MAX(timestamp) FROM observations",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;
                Some((parse_timestamp(&min)?, parse_timestamp(&max)?))
            } else {
                None
            };

            // page_count * page_size reflects the database itself, unskewed
            // by WAL checkpoint state.
            let page_count: i64 =
                conn.pragma_query_value(None, "page_count", |row| row.get(0))?;
            let page_size: i64 = conn.pragma_query_value(None, "page_size", |row| row.get(0))?;

            Ok(StoreStats {
                total: total as u64,
                by_context,
                by_kind,
                date_range,
                size_on_disk_bytes: (page_count * page_size) as u64,
            })
        })
    }
}

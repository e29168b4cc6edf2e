//! Database migrations

use rusqlite::Connection;

pub const SCHEMA_VERSION: i32 = 2;

pub fn run_migrations(conn: &Connection) -> Result<(), rusqlite::Error> {
    let current_version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    tracing::info!(
        "Database schema version: {} (target: {})",
        current_version,
        SCHEMA_VERSION
    );

    if current_version < 1 {
        tracing::info!("Running migration v1: observation log and sessions");
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS observations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                context TEXT NOT NULL,
                kind TEXT NOT NULL,
                summary TEXT NOT NULL,
                detail TEXT,
                related_paths TEXT NOT NULL DEFAULT '[]',
                session_id INTEGER
            );

            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                context TEXT NOT NULL,
                started_at TEXT NOT NULL,
                ended_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_observations_context ON observations(context);
            CREATE INDEX IF NOT EXISTS idx_observations_kind ON observations(kind);
            CREATE INDEX IF NOT EXISTS idx_observations_timestamp ON observations(timestamp);
            CREATE INDEX IF NOT EXISTS idx_observations_session ON observations(session_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_context ON sessions(context);

            -- Corrections are new observations; the log never rewrites history.
            CREATE TRIGGER IF NOT EXISTS observations_no_update
            BEFORE UPDATE ON observations
            BEGIN
                SELECT RAISE(ABORT, 'observations are append-only');
            END;

            CREATE TRIGGER IF NOT EXISTS observations_no_delete
            BEFORE DELETE ON observations
            BEGIN
                SELECT RAISE(ABORT, 'observations are append-only');
            END;
            "#,
        )?;
    }

    if current_version < 2 {
        tracing::info!("Running migration v2: update queue and applied-fragment ledger");
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS applied_fragments (
                fingerprint TEXT PRIMARY KEY,
                target_document TEXT NOT NULL,
                applied_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS update_queue (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                pattern_kind TEXT NOT NULL,
                target_document TEXT NOT NULL,
                fragment TEXT NOT NULL,
                confidence REAL NOT NULL,
                evidence TEXT NOT NULL,
                status TEXT NOT NULL CHECK(status IN ('pending', 'applied', 'rejected')) DEFAULT 'pending',
                reason TEXT,
                created_at TEXT NOT NULL,
                resolved_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_update_queue_status ON update_queue(status);
            "#,
        )?;
    }

    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tracing::info!("Database schema up to date (version {})", SCHEMA_VERSION);

    Ok(())
}

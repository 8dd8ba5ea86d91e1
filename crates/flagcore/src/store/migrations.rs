//! Embedded, monotone numbered schema migrations (§4.1).
//!
//! Applied up to the current version on every read-write open. A stored
//! version beyond the last known migration (e.g. after a downgrade) is
//! treated as success, since migrations are required to be idempotent and
//! forward-compatible. A "dirty" marker left by a previous crash is
//! force-resolved to its declared version before anything else runs.

use rusqlite::{Connection, OptionalExtension};

use crate::error::StoreError;

/// Each entry is applied via `execute_batch`, so a migration may contain
/// multiple statements.
const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS flags (name TEXT PRIMARY KEY, value TEXT NOT NULL);
    CREATE TABLE IF NOT EXISTS startup_settings (name TEXT PRIMARY KEY, value TEXT NOT NULL);
    CREATE TABLE IF NOT EXISTS watchdog_logs (
        rowid INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp INTEGER NOT NULL,
        log TEXT NOT NULL
    );
    "#,
];

pub(crate) fn run(conn: &mut Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (version INTEGER NOT NULL, dirty INTEGER NOT NULL)",
    )?;

    let state: Option<(i64, i64)> = conn
        .query_row(
            "SELECT version, dirty FROM schema_migrations LIMIT 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let (mut version, dirty) = match state {
        Some(state) => state,
        None => {
            conn.execute(
                "INSERT INTO schema_migrations (version, dirty) VALUES (0, 0)",
                [],
            )?;
            (0, 0)
        }
    };

    if dirty != 0 {
        tracing::warn!(version, "force-resolving dirty migration marker");
        conn.execute("UPDATE schema_migrations SET dirty = 0", [])?;
    }

    let target = MIGRATIONS.len() as i64;
    if version >= target {
        return Ok(());
    }

    while version < target {
        let next = version + 1;
        conn.execute("UPDATE schema_migrations SET dirty = 1", [])?;
        conn.execute_batch(MIGRATIONS[(next - 1) as usize])?;
        conn.execute(
            "UPDATE schema_migrations SET version = ?1, dirty = 0",
            [next],
        )?;
        version = next;
    }
    Ok(())
}

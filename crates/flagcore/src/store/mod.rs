//! Durable, SQL-backed storage (§4.1): an ordered `name -> value` map with
//! atomic bulk replace-set, and a timestamped append-log variant.

mod kv;
mod log;
mod migrations;

pub use kv::SqliteKvStore;
pub use log::LogStore;

use std::path::Path;
use std::time::Duration;

use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;

use crate::error::StoreError;

pub(crate) type Pool = r2d2::Pool<SqliteConnectionManager>;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) a connection pool against `path`.
///
/// For a read-write open this runs the quick-check/recreate-on-corruption
/// startup repair and the embedded migration set (§4.1 "Startup repair").
/// A read-only open skips both: it must never mutate a file it may not have
/// permission to write, and a sibling reader has no schema to bring forward.
pub(crate) fn open_pool(path: &Path, read_only: bool) -> Result<Pool, StoreError> {
    if read_only {
        let manager = SqliteConnectionManager::file(path)
            .with_flags(OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX);
        let pool = Pool::builder().build(manager)?;
        // Force one connection now so a missing file surfaces here rather
        // than on the caller's first `get`.
        pool.get()?;
        return Ok(pool);
    }

    repair_if_needed(path)?;

    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(())
    });
    let pool = Pool::builder().build(manager)?;
    migrations::run(&mut pool.get()?)?;
    Ok(pool)
}

/// Quick-checks an existing file; if missing, corrupt, or failing
/// quick-check, removes it so the caller recreates it empty.
fn repair_if_needed(path: &Path) -> Result<(), StoreError> {
    if !path.exists() {
        return Ok(());
    }

    let healthy = rusqlite::Connection::open(path)
        .and_then(|conn| conn.pragma_query_value(None, "quick_check", |row| row.get::<_, String>(0)))
        .map(|result| result == "ok")
        .unwrap_or(false);

    if !healthy {
        tracing::warn!(path = %path.display(), "flag store failed quick-check, recreating");
        std::fs::remove_file(path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn repair_recreates_a_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kv.sqlite");
        std::fs::write(&path, b"not a sqlite file").unwrap();

        let pool = open_pool(&path, false).unwrap();
        // A fresh connection from the rebuilt pool can run a trivial query.
        let conn = pool.get().unwrap();
        let value: i64 = conn.query_row("SELECT 1", [], |row| row.get(0)).unwrap();
        assert_eq!(value, 1);
    }

    #[test]
    fn read_only_open_does_not_create_a_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kv.sqlite");
        assert!(open_pool(&path, true).is_err());
        assert!(!path.exists());
    }
}

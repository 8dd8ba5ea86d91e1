//! `LogStore`: the timestamped append-log shape (§4.1, §6's `watchdog_logs`
//! table).

use std::path::Path;

use rusqlite::params;

use super::{open_pool, Pool};
use crate::error::StoreError;

const TABLE: &str = "watchdog_logs";

pub struct LogStore {
    pool: Pool,
    read_only: bool,
}

impl LogStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let pool = open_pool(path, false)?;
        pool.get()?.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {TABLE} (
                rowid INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp INTEGER NOT NULL,
                log TEXT NOT NULL
            )"
        ))?;
        Ok(Self {
            pool,
            read_only: false,
        })
    }

    pub fn open_read_only(path: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            pool: open_pool(path, true)?,
            read_only: true,
        })
    }

    pub fn append(&self, timestamp: i64, log: &str) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        let conn = self.pool.get()?;
        conn.execute(
            &format!("INSERT INTO {TABLE} (timestamp, log) VALUES (?1, ?2)"),
            params![timestamp, log],
        )?;
        Ok(())
    }

    /// Visits every row in insertion order. `callback` may return an error
    /// to stop iteration early; it is propagated to the caller.
    pub fn for_each<F>(&self, mut callback: F) -> Result<(), StoreError>
    where
        F: FnMut(i64, i64, &str) -> Result<(), StoreError>,
    {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!("SELECT rowid, timestamp, log FROM {TABLE} ORDER BY rowid"))?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let rowid: i64 = row.get(0)?;
            let timestamp: i64 = row.get(1)?;
            let log: String = row.get(2)?;
            callback(rowid, timestamp, &log)?;
        }
        Ok(())
    }

    pub fn delete_rows(&self, rowids: &[i64]) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        if rowids.is_empty() {
            return Ok(());
        }
        let conn = self.pool.get()?;
        let placeholders = rowids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        conn.execute(
            &format!("DELETE FROM {TABLE} WHERE rowid IN ({placeholders})"),
            rusqlite::params_from_iter(rowids.iter()),
        )?;
        Ok(())
    }

    pub fn count(&self) -> Result<i64, StoreError> {
        let conn = self.pool.get()?;
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {TABLE}"), [], |row| {
            row.get(0)
        })?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn append_for_each_and_delete() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::open(&dir.path().join("kv.sqlite")).unwrap();

        store.append(100, "first").unwrap();
        store.append(200, "second").unwrap();
        assert_eq!(store.count().unwrap(), 2);

        let mut seen = Vec::new();
        store
            .for_each(|rowid, timestamp, log| {
                seen.push((rowid, timestamp, log.to_string()));
                Ok(())
            })
            .unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].1, 100);
        assert_eq!(seen[1].2, "second");

        let first_rowid = seen[0].0;
        store.delete_rows(&[first_rowid]).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn read_only_handle_rejects_append() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kv.sqlite");
        LogStore::open(&path).unwrap();

        let reader = LogStore::open_read_only(&path).unwrap();
        assert!(matches!(reader.append(1, "x"), Err(StoreError::ReadOnly)));
    }
}

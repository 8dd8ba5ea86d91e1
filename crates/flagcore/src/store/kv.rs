//! `SqliteKvStore`: the `(name, value)` shape shared by the flag store and
//! the startup settings mirror (§4.1, §6).

use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::{params, params_from_iter, OptionalExtension};

use super::{open_pool, Pool};
use crate::error::StoreError;
use crate::value::EncodedValue;

/// A durable `name -> value` map. The same shape backs more than one
/// logical table (the flag store and the startup-settings mirror), so the
/// table name is a constructor argument rather than hard-coded.
pub struct SqliteKvStore {
    pool: Pool,
    table: &'static str,
    read_only: bool,
}

impl SqliteKvStore {
    pub fn open(path: &Path, table: &'static str) -> Result<Self, StoreError> {
        let pool = open_pool(path, false)?;
        pool.get()?.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (name TEXT PRIMARY KEY, value TEXT NOT NULL)"
        ))?;
        Ok(Self {
            pool,
            table,
            read_only: false,
        })
    }

    pub fn open_read_only(path: &Path, table: &'static str) -> Result<Self, StoreError> {
        Ok(Self {
            pool: open_pool(path, true)?,
            table,
            read_only: true,
        })
    }

    pub fn get(&self, key: &str) -> Result<Option<EncodedValue>, StoreError> {
        let conn = self.pool.get()?;
        let bytes: Option<Vec<u8>> = conn
            .query_row(
                &format!("SELECT value FROM {} WHERE name = ?1", self.table),
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(bytes.map(EncodedValue::from_bytes))
    }

    pub fn set(&self, key: &str, value: &EncodedValue) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        let conn = self.pool.get()?;
        conn.execute(
            &format!(
                "INSERT INTO {0} (name, value) VALUES (?1, ?2) \
                 ON CONFLICT(name) DO UPDATE SET value = excluded.value",
                self.table
            ),
            params![key, value.as_bytes()],
        )?;
        tracing::debug!(table = self.table, key, "set flag value");
        Ok(())
    }

    /// Atomic replace-set (§4.1): upserts every pair, deletes every row
    /// whose name is absent from `pairs`, and returns the deleted names.
    pub fn update(
        &self,
        pairs: &BTreeMap<String, EncodedValue>,
    ) -> Result<Vec<String>, StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        {
            let mut upsert = tx.prepare(&format!(
                "INSERT INTO {0} (name, value) VALUES (?1, ?2) \
                 ON CONFLICT(name) DO UPDATE SET value = excluded.value",
                self.table
            ))?;
            for (name, value) in pairs {
                upsert.execute(params![name, value.as_bytes()])?;
            }
        }

        // Empty `pairs` is legal and must be a no-op: no row in an empty
        // map is "absent", so nothing is deleted (spec §4.1: "Empty `pairs`
        // is legal and yields an empty deletion list without mutation").
        // `WHERE name NOT IN ()` is not valid SQL with zero placeholders,
        // so this case is handled separately rather than falling through to
        // the general delete statement below.
        let deleted = if pairs.is_empty() {
            Vec::new()
        } else {
            let placeholders = pairs.keys().map(|_| "?").collect::<Vec<_>>().join(", ");
            let delete_sql = format!(
                "DELETE FROM {0} WHERE name NOT IN ({1}) RETURNING name",
                self.table, placeholders
            );
            let mut stmt = tx.prepare(&delete_sql)?;
            let rows = stmt.query_map(params_from_iter(pairs.keys()), |row| {
                row.get::<_, String>(0)
            })?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        tx.commit()?;
        tracing::debug!(
            table = self.table,
            upserted = pairs.len(),
            deleted = deleted.len(),
            "bulk replace-set applied"
        );
        Ok(deleted)
    }
}

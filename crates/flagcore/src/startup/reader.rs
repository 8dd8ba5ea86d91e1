//! The reader side of the startup mirror (§4.6), held by sibling processes
//! (watchdog, desktop helper) that start independently of the main agent.

use std::path::Path;

use crate::error::StartupError;
use crate::key::FlagKey;
use crate::store::SqliteKvStore;

/// Opens the mirror read-only: no migration, no table creation. Tolerates
/// either the current `kv.sqlite`'s `startup_settings` table or the legacy
/// `startup.db` file (§6).
pub struct StartupSettingsReader {
    store: SqliteKvStore,
}

impl StartupSettingsReader {
    pub fn open(root_directory: &Path) -> Result<Self, StartupError> {
        let primary = root_directory.join("kv.sqlite");
        if let Ok(store) = SqliteKvStore::open_read_only(&primary, "startup_settings") {
            return Ok(Self { store });
        }

        let legacy = root_directory.join("startup.db");
        let store =
            SqliteKvStore::open_read_only(&legacy, "startup_settings").map_err(StartupError::from)?;
        Ok(Self { store })
    }

    /// `None` on a missing file or a missing row; both are ordinary
    /// "not configured yet" states, not errors, for a reader that starts
    /// before the writer has run at all.
    pub fn get(&self, key: FlagKey) -> Option<String> {
        self.get_raw(key.as_str())
    }

    /// Like [`Self::get`], but for a mirror row that has no [`FlagKey`] of
    /// its own — e.g. a derived entry the writer merged in via its
    /// `extra()` source (§4.6).
    pub fn get_raw(&self, name: &str) -> Option<String> {
        match self.store.get(name) {
            Ok(Some(value)) => value.decode_string().ok(),
            Ok(None) => None,
            Err(error) => {
                tracing::debug!(name, %error, "startup settings read failed");
                None
            }
        }
    }
}

//! The writer side of the startup mirror (§4.6), held by the main agent
//! process.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::controller::FlagController;
use crate::error::StartupError;
use crate::key::FlagKey;
use crate::observer::Observer;
use crate::store::SqliteKvStore;
use crate::value::EncodedValue;

/// One entry per curated key: how to read its current stringified value
/// from the controller.
pub type CuratedEntry = (FlagKey, fn(&FlagController) -> String);

/// A source of entries outside the curated flag subset (§4.6: "an
/// `auto_table_construction` JSON extract from a different config store"),
/// computed fresh on every `write_settings()` call so it stays part of the
/// same atomic `store.update`. Keyed by the mirror row name, valued as a
/// `serde_json::Value` so callers can hand over structured data without
/// hand-rolling their own stringification.
pub type ExtraEntriesFn = Box<dyn Fn() -> BTreeMap<String, serde_json::Value> + Send + Sync>;

/// Opens the mirror read-write, performs an initial write, and registers
/// itself as a controller observer for every curated key. A store-open
/// failure here is fatal (propagated); a later refresh failure is logged
/// and swallowed, since the next flag change retries it.
pub struct StartupSettingsWriter {
    store: SqliteKvStore,
    controller: Arc<FlagController>,
    curated: Vec<CuratedEntry>,
    extra: ExtraEntriesFn,
}

impl StartupSettingsWriter {
    pub fn open(
        root_directory: &Path,
        controller: Arc<FlagController>,
        curated: Vec<CuratedEntry>,
    ) -> Result<Arc<Self>, StartupError> {
        Self::open_with_extra(root_directory, controller, curated, Box::new(BTreeMap::new))
    }

    /// Like [`Self::open`], but also merges `extra()` into every
    /// `write_settings()` pass, so derived entries sourced from outside the
    /// controller (a different config store, a computed table) stay
    /// atomically consistent with the curated flag subset.
    pub fn open_with_extra(
        root_directory: &Path,
        controller: Arc<FlagController>,
        curated: Vec<CuratedEntry>,
        extra: ExtraEntriesFn,
    ) -> Result<Arc<Self>, StartupError> {
        let path = root_directory.join("kv.sqlite");
        let store = SqliteKvStore::open(&path, "startup_settings").map_err(StartupError::from)?;

        let writer = Arc::new(Self {
            store,
            controller,
            curated,
            extra,
        });
        writer.write_settings();

        let keys: Vec<FlagKey> = writer.curated.iter().map(|(key, _)| *key).collect();
        let observer: Arc<dyn Observer> = Arc::clone(&writer);
        writer.controller.register_observer(observer, keys);

        Ok(writer)
    }

    /// Reads each curated getter, stringifies, merges in `extra()`, and
    /// performs a single `store.update` — which also deletes any stale key
    /// no longer in the curated subset or the extra source.
    fn write_settings(&self) {
        let mut pairs: BTreeMap<String, EncodedValue> = self
            .curated
            .iter()
            .map(|(key, stringify)| (key.as_str().to_string(), EncodedValue::encode_string(&stringify(&self.controller))))
            .collect();

        for (name, value) in (self.extra)() {
            let text = match &value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            pairs.insert(name, EncodedValue::encode_string(&text));
        }

        if let Err(error) = self.store.update(&pairs) {
            tracing::warn!(%error, "startup mirror refresh failed, will retry on next flag change");
        }
    }
}

impl Observer for StartupSettingsWriter {
    fn flags_changed(&self, _changed: &[FlagKey]) {
        self.write_settings();
    }
}

//! `FlagController` (§4.4): the facade exposing one typed getter/setter per
//! flag key, mediating the store, resolvers, overrides, and observers.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::error::ConfigError;
use crate::key::FlagKey;
use crate::observer::{Observer, ObserverRegistry};
use crate::options::Options;
use crate::override_registry::OverrideRegistry;
use crate::resolver;
use crate::schema;
use crate::store::SqliteKvStore;
use crate::value::{EncodedValue, TypedValue};

/// A typed getter/setter per key, wired to durable storage, bounded-lifetime
/// overrides, and change notification. Constructed once per process and
/// shared by every subsystem that reads flags (§3 "Lifecycles").
///
/// Generic over the [`Clock`] its override registry uses, defaulting to the
/// real [`SystemClock`] everywhere outside tests. A test that needs to
/// assert override-expiry behavior without sleeping on the full requested
/// duration constructs one with [`FlagController::with_clock`] instead of
/// [`FlagController::open`]/[`FlagController::with_store`].
pub struct FlagController<C: Clock = SystemClock> {
    options: Options,
    store: SqliteKvStore,
    overrides: Arc<OverrideRegistry<C>>,
    observers: Arc<ObserverRegistry>,
}

/// Bool getter/setter for a key with no override path.
macro_rules! bool_flag {
    ($get:ident, $set:ident, $key:expr, $field:ident) => {
        pub fn $get(&self) -> bool {
            let remote = self.read_store($key);
            resolver::resolve_bool($key, self.options.$field, remote.as_ref(), None)
        }

        pub fn $set(&self, value: bool) -> Result<(), ConfigError> {
            self.write_and_notify($key, EncodedValue::encode_bool(value))
        }
    };
}

/// Bool getter/setter plus a timed-override setter (§4.4's allowlist).
macro_rules! bool_flag_overridable {
    ($get:ident, $set:ident, $override:ident, $key:expr, $field:ident) => {
        pub fn $get(&self) -> bool {
            let override_value = self.overrides.value_of($key);
            let remote = self.read_store($key);
            resolver::resolve_bool($key, self.options.$field, remote.as_ref(), override_value.as_ref())
        }

        pub fn $set(&self, value: bool) -> Result<(), ConfigError> {
            self.write_and_notify($key, EncodedValue::encode_bool(value))
        }

        pub fn $override(&self, value: bool, duration: Duration) {
            self.overrides
                .start(&self.observers, $key, TypedValue::Bool(value), duration);
        }
    };
}

macro_rules! duration_flag {
    ($get:ident, $set:ident, $key:expr, $field:ident, $clamp:expr) => {
        pub fn $get(&self) -> Duration {
            let remote = self.read_store($key);
            resolver::resolve_duration($key, self.options.$field, $clamp, remote.as_ref(), None)
        }

        pub fn $set(&self, value: Duration) -> Result<(), ConfigError> {
            self.write_and_notify($key, EncodedValue::encode_duration(value))
        }
    };
}

macro_rules! duration_flag_overridable {
    ($get:ident, $set:ident, $override:ident, $key:expr, $field:ident, $clamp:expr) => {
        pub fn $get(&self) -> Duration {
            let override_value = self.overrides.value_of($key);
            let remote = self.read_store($key);
            resolver::resolve_duration(
                $key,
                self.options.$field,
                $clamp,
                remote.as_ref(),
                override_value.as_ref(),
            )
        }

        pub fn $set(&self, value: Duration) -> Result<(), ConfigError> {
            self.write_and_notify($key, EncodedValue::encode_duration(value))
        }

        pub fn $override(&self, value: Duration, duration: Duration) {
            self.overrides
                .start(&self.observers, $key, TypedValue::Duration(value), duration);
        }
    };
}

macro_rules! int_flag {
    ($get:ident, $set:ident, $key:expr, $field:ident, $clamp:expr) => {
        pub fn $get(&self) -> i64 {
            let remote = self.read_store($key);
            resolver::resolve_int($key, self.options.$field, $clamp, remote.as_ref(), None)
        }

        pub fn $set(&self, value: i64) -> Result<(), ConfigError> {
            self.write_and_notify($key, EncodedValue::encode_int(value))
        }
    };
}

macro_rules! float_flag_overridable {
    ($get:ident, $set:ident, $override:ident, $key:expr, $field:ident, $clamp:expr) => {
        pub fn $get(&self) -> f64 {
            let override_value = self.overrides.value_of($key);
            let remote = self.read_store($key);
            resolver::resolve_float(
                $key,
                self.options.$field,
                $clamp,
                remote.as_ref(),
                override_value.as_ref(),
            )
        }

        pub fn $set(&self, value: f64) -> Result<(), ConfigError> {
            self.write_and_notify($key, EncodedValue::encode_float(value))
        }

        pub fn $override(&self, value: f64, duration: Duration) {
            self.overrides
                .start(&self.observers, $key, TypedValue::Float(value), duration);
        }
    };
}

macro_rules! string_flag {
    ($get:ident, $set:ident, $key:expr, $field:ident) => {
        pub fn $get(&self) -> String {
            let remote = self.read_store($key);
            resolver::resolve_string($key, &self.options.$field, None, remote.as_ref(), None)
        }

        pub fn $set(&self, value: &str) -> Result<(), ConfigError> {
            self.write_and_notify($key, EncodedValue::encode_string(value))
        }
    };
}

macro_rules! string_flag_sanitized {
    ($get:ident, $set:ident, $key:expr, $field:ident, $sanitizer:expr) => {
        pub fn $get(&self) -> String {
            let remote = self.read_store($key);
            resolver::resolve_string(
                $key,
                &self.options.$field,
                Some($sanitizer),
                remote.as_ref(),
                None,
            )
        }

        pub fn $set(&self, value: &str) -> Result<(), ConfigError> {
            self.write_and_notify($key, EncodedValue::encode_string(value))
        }
    };
}

macro_rules! string_flag_sanitized_overridable {
    ($get:ident, $set:ident, $override:ident, $key:expr, $field:ident, $sanitizer:expr) => {
        pub fn $get(&self) -> String {
            let override_value = self.overrides.value_of($key);
            let remote = self.read_store($key);
            resolver::resolve_string(
                $key,
                &self.options.$field,
                Some($sanitizer),
                remote.as_ref(),
                override_value.as_ref(),
            )
        }

        pub fn $set(&self, value: &str) -> Result<(), ConfigError> {
            self.write_and_notify($key, EncodedValue::encode_string(value))
        }

        pub fn $override(&self, value: &str, duration: Duration) {
            self.overrides.start(
                &self.observers,
                $key,
                TypedValue::String(value.to_string()),
                duration,
            );
        }
    };
}

/// Getter only, reading straight from the options struct: no store path, no
/// remote override (§9's open question on `allowed_extensions`/
/// `osquery_flags`/`cert_pins`, and enrollment credentials which are
/// explicitly "not remotely settable" per §6).
macro_rules! readonly_string_flag {
    ($get:ident, $field:ident) => {
        pub fn $get(&self) -> String {
            self.options.$field.clone()
        }
    };
}

macro_rules! readonly_slice_flag {
    ($get:ident, $field:ident) => {
        pub fn $get(&self) -> &[String] {
            &self.options.$field
        }
    };
}

impl FlagController<SystemClock> {
    /// Opens the flag store in `options.root_directory` and constructs the
    /// controller. Migrations run as part of the open (§4.1).
    pub fn open(options: Options) -> Result<Self, ConfigError> {
        let path = Path::new(&options.root_directory).join("kv.sqlite");
        let store = SqliteKvStore::open(&path, "flags").map_err(ConfigError::from)?;
        Ok(Self {
            options,
            store,
            overrides: OverrideRegistry::new(),
            observers: ObserverRegistry::new(),
        })
    }

    /// For tests and embedders that already manage the store's lifetime.
    pub fn with_store(options: Options, store: SqliteKvStore) -> Self {
        Self {
            options,
            store,
            overrides: OverrideRegistry::new(),
            observers: ObserverRegistry::new(),
        }
    }
}

impl<C: Clock> FlagController<C> {
    /// Like [`FlagController::with_store`], but with an injected [`Clock`]
    /// driving override expiry — for tests that want to advance a
    /// [`crate::clock::ManualClock`] instead of sleeping on a real timed
    /// override.
    pub fn with_clock(options: Options, store: SqliteKvStore, clock: Arc<C>) -> Self {
        Self {
            options,
            store,
            overrides: Arc::new(OverrideRegistry::with_clock(clock)),
            observers: ObserverRegistry::new(),
        }
    }

    pub fn register_observer(&self, observer: Arc<dyn Observer>, keys: impl IntoIterator<Item = FlagKey>) {
        self.observers.register(observer, keys);
    }

    pub fn deregister_observer(&self, observer: &Arc<dyn Observer>) {
        self.observers.deregister(observer);
    }

    /// Bulk replace-set (§4.4). Notification happens before returning even
    /// if the store update itself errored — preserved intentionally, see
    /// the open question in `DESIGN.md`.
    pub fn update(&self, pairs: BTreeMap<String, EncodedValue>) -> (Vec<FlagKey>, Result<(), ConfigError>) {
        let result = self.store.update(&pairs);

        let deleted: Vec<String> = match &result {
            Ok(deleted) => deleted.clone(),
            Err(error) => {
                tracing::debug!(%error, "bulk update failed");
                Vec::new()
            }
        };

        let changed: std::collections::BTreeSet<FlagKey> = pairs
            .keys()
            .chain(deleted.iter())
            .filter_map(|name| FlagKey::parse(name))
            .collect();
        let changed: Vec<FlagKey> = changed.into_iter().collect();

        self.observers.notify(&changed);

        match result {
            Ok(_) => (changed, Ok(())),
            Err(error) => (changed, Err(ConfigError::from(error))),
        }
    }

    /// Every flag's current resolved value, stringified. A diagnostic
    /// convenience (not in the distilled contract) for a support bundle or
    /// `--dump-flags` verb in the consuming binary.
    pub fn snapshot(&self) -> BTreeMap<FlagKey, String> {
        FlagKey::ALL.iter().map(|&key| (key, self.resolved_string(key))).collect()
    }

    fn resolved_string(&self, key: FlagKey) -> String {
        match key {
            FlagKey::Hostname => self.hostname(),
            FlagKey::EnrollSecret => self.enroll_secret(),
            FlagKey::EnrollSecretPath => self.enroll_secret_path(),
            FlagKey::RootDirectory => self.root_directory(),
            FlagKey::OsquerydPath => self.osqueryd_path(),
            FlagKey::LoggingInterval => humantime::format_duration(self.logging_interval()).to_string(),
            FlagKey::ControlRequestInterval => {
                humantime::format_duration(self.control_request_interval()).to_string()
            }
            FlagKey::InsecureTls => self.insecure_tls().to_string(),
            FlagKey::InsecureTransport => self.insecure_transport().to_string(),
            FlagKey::Autoupdate => self.autoupdate().to_string(),
            FlagKey::UpdateChannel => self.update_channel(),
            FlagKey::AutoupdateInterval => humantime::format_duration(self.autoupdate_interval()).to_string(),
            FlagKey::AutoupdateInitialDelay => {
                humantime::format_duration(self.autoupdate_initial_delay()).to_string()
            }
            FlagKey::UseTufAutoupdater => self.use_tuf_autoupdater().to_string(),
            FlagKey::PinnedLauncherVersion => self.pinned_launcher_version(),
            FlagKey::PinnedOsqueryVersion => self.pinned_osquery_version(),
            FlagKey::WatchdogEnabled => self.watchdog_enabled().to_string(),
            FlagKey::WatchdogDelaySeconds => self.watchdog_delay_seconds().to_string(),
            FlagKey::WatchdogMemoryMb => self.watchdog_memory_mb().to_string(),
            FlagKey::WatchdogCpuUtilizationPercent => self.watchdog_cpu_utilization_percent().to_string(),
            FlagKey::TraceExportEnabled => self.trace_export_enabled().to_string(),
            FlagKey::TraceSamplingRate => self.trace_sampling_rate().to_string(),
            FlagKey::TraceBatchTimeout => humantime::format_duration(self.trace_batch_timeout()).to_string(),
            FlagKey::LogIngestUrl => self.log_ingest_url(),
            FlagKey::TraceIngestUrl => self.trace_ingest_url(),
            FlagKey::DesktopEnabled => self.desktop_enabled().to_string(),
            FlagKey::DesktopUpdateInterval => {
                humantime::format_duration(self.desktop_update_interval()).to_string()
            }
            FlagKey::DesktopMenuRefreshInterval => {
                humantime::format_duration(self.desktop_menu_refresh_interval()).to_string()
            }
            FlagKey::OsqueryHealthcheckStartupDelay => {
                humantime::format_duration(self.osquery_healthcheck_startup_delay()).to_string()
            }
            FlagKey::LogShippingLevel => self.log_shipping_level(),
            FlagKey::AllowedExtensions => self.allowed_extensions().join(","),
            FlagKey::OsqueryFlags => self.osquery_flags().join(","),
            FlagKey::CertPins => self.cert_pins().join(","),
        }
    }

    fn read_store(&self, key: FlagKey) -> Option<EncodedValue> {
        match self.store.get(key.as_str()) {
            Ok(value) => value,
            Err(error) => {
                tracing::debug!(%key, %error, "store read failed, using default");
                None
            }
        }
    }

    fn write_and_notify(&self, key: FlagKey, bytes: EncodedValue) -> Result<(), ConfigError> {
        self.store.set(key.as_str(), &bytes).map_err(|error| {
            tracing::debug!(%key, %error, "store write failed");
            ConfigError::from(error)
        })?;
        self.observers.notify(&[key]);
        Ok(())
    }

    string_flag!(hostname, set_hostname, FlagKey::Hostname, hostname);
    readonly_string_flag!(enroll_secret, enroll_secret);
    readonly_string_flag!(enroll_secret_path, enroll_secret_path);
    readonly_string_flag!(root_directory, root_directory);
    string_flag!(osqueryd_path, set_osqueryd_path, FlagKey::OsquerydPath, osqueryd_path);

    duration_flag!(
        logging_interval,
        set_logging_interval,
        FlagKey::LoggingInterval,
        logging_interval,
        schema::LOGGING_INTERVAL
    );
    duration_flag_overridable!(
        control_request_interval,
        set_control_request_interval,
        override_control_request_interval,
        FlagKey::ControlRequestInterval,
        control_request_interval,
        schema::CONTROL_REQUEST_INTERVAL
    );

    bool_flag!(insecure_tls, set_insecure_tls, FlagKey::InsecureTls, insecure_tls);
    bool_flag!(
        insecure_transport,
        set_insecure_transport,
        FlagKey::InsecureTransport,
        insecure_transport
    );

    bool_flag!(autoupdate, set_autoupdate, FlagKey::Autoupdate, autoupdate);
    string_flag_sanitized!(
        update_channel,
        set_update_channel,
        FlagKey::UpdateChannel,
        update_channel,
        schema::sanitize_update_channel
    );
    duration_flag!(
        autoupdate_interval,
        set_autoupdate_interval,
        FlagKey::AutoupdateInterval,
        autoupdate_interval,
        schema::AUTOUPDATE_INTERVAL
    );
    duration_flag!(
        autoupdate_initial_delay,
        set_autoupdate_initial_delay,
        FlagKey::AutoupdateInitialDelay,
        autoupdate_initial_delay,
        schema::AUTOUPDATE_INITIAL_DELAY
    );
    bool_flag!(
        use_tuf_autoupdater,
        set_use_tuf_autoupdater,
        FlagKey::UseTufAutoupdater,
        use_tuf_autoupdater
    );
    string_flag!(
        pinned_launcher_version,
        set_pinned_launcher_version,
        FlagKey::PinnedLauncherVersion,
        pinned_launcher_version
    );
    string_flag!(
        pinned_osquery_version,
        set_pinned_osquery_version,
        FlagKey::PinnedOsqueryVersion,
        pinned_osquery_version
    );

    bool_flag!(
        watchdog_enabled,
        set_watchdog_enabled,
        FlagKey::WatchdogEnabled,
        watchdog_enabled
    );
    int_flag!(
        watchdog_delay_seconds,
        set_watchdog_delay_seconds,
        FlagKey::WatchdogDelaySeconds,
        watchdog_delay_seconds,
        schema::WATCHDOG_DELAY_SECONDS
    );
    int_flag!(
        watchdog_memory_mb,
        set_watchdog_memory_mb,
        FlagKey::WatchdogMemoryMb,
        watchdog_memory_mb,
        schema::WATCHDOG_MEMORY_MB
    );
    int_flag!(
        watchdog_cpu_utilization_percent,
        set_watchdog_cpu_utilization_percent,
        FlagKey::WatchdogCpuUtilizationPercent,
        watchdog_cpu_utilization_percent,
        schema::WATCHDOG_CPU_UTILIZATION_PERCENT
    );

    bool_flag_overridable!(
        trace_export_enabled,
        set_trace_export_enabled,
        override_trace_export_enabled,
        FlagKey::TraceExportEnabled,
        trace_export_enabled
    );
    float_flag_overridable!(
        trace_sampling_rate,
        set_trace_sampling_rate,
        override_trace_sampling_rate,
        FlagKey::TraceSamplingRate,
        trace_sampling_rate,
        schema::TRACE_SAMPLING_RATE
    );
    duration_flag!(
        trace_batch_timeout,
        set_trace_batch_timeout,
        FlagKey::TraceBatchTimeout,
        trace_batch_timeout,
        schema::TRACE_BATCH_TIMEOUT
    );

    string_flag!(log_ingest_url, set_log_ingest_url, FlagKey::LogIngestUrl, log_ingest_url);
    string_flag!(trace_ingest_url, set_trace_ingest_url, FlagKey::TraceIngestUrl, trace_ingest_url);

    bool_flag!(desktop_enabled, set_desktop_enabled, FlagKey::DesktopEnabled, desktop_enabled);
    duration_flag!(
        desktop_update_interval,
        set_desktop_update_interval,
        FlagKey::DesktopUpdateInterval,
        desktop_update_interval,
        schema::DESKTOP_UPDATE_INTERVAL
    );
    duration_flag!(
        desktop_menu_refresh_interval,
        set_desktop_menu_refresh_interval,
        FlagKey::DesktopMenuRefreshInterval,
        desktop_menu_refresh_interval,
        schema::DESKTOP_MENU_REFRESH_INTERVAL
    );

    duration_flag!(
        osquery_healthcheck_startup_delay,
        set_osquery_healthcheck_startup_delay,
        FlagKey::OsqueryHealthcheckStartupDelay,
        osquery_healthcheck_startup_delay,
        schema::OSQUERY_HEALTHCHECK_STARTUP_DELAY
    );
    string_flag_sanitized_overridable!(
        log_shipping_level,
        set_log_shipping_level,
        override_log_shipping_level,
        FlagKey::LogShippingLevel,
        log_shipping_level,
        schema::sanitize_log_shipping_level
    );

    readonly_slice_flag!(allowed_extensions, allowed_extensions);
    readonly_slice_flag!(osquery_flags, osquery_flags);
    readonly_slice_flag!(cert_pins, cert_pins);
}

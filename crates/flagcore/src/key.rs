//! The closed enumeration of flag identifiers.
//!
//! `FlagKey` is intentionally not a free-form string: every key the core
//! understands is enumerated here so that clamp tables, sanitizers, and the
//! curated startup-mirror subset can all be exhaustively matched against it.
//! Equality and set membership are the only semantically meaningful
//! relations; the `Ord` impl exists only so the type can live in a
//! `BTreeSet` when a stable iteration order is convenient, not because key
//! ordering means anything.

use std::fmt;

/// A single named, typed configuration knob understood by the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum FlagKey {
    Hostname,
    EnrollSecret,
    EnrollSecretPath,
    RootDirectory,
    OsquerydPath,

    LoggingInterval,
    ControlRequestInterval,

    InsecureTls,
    InsecureTransport,

    Autoupdate,
    UpdateChannel,
    AutoupdateInterval,
    AutoupdateInitialDelay,
    UseTufAutoupdater,
    PinnedLauncherVersion,
    PinnedOsqueryVersion,

    WatchdogEnabled,
    WatchdogDelaySeconds,
    WatchdogMemoryMb,
    WatchdogCpuUtilizationPercent,

    TraceExportEnabled,
    TraceSamplingRate,
    TraceBatchTimeout,

    LogIngestUrl,
    TraceIngestUrl,

    DesktopEnabled,
    DesktopUpdateInterval,
    DesktopMenuRefreshInterval,

    OsqueryHealthcheckStartupDelay,
    LogShippingLevel,

    // No remote override path; getters return the raw options-struct slice.
    AllowedExtensions,
    OsqueryFlags,
    CertPins,
}

impl FlagKey {
    /// All keys, for iteration (snapshotting, schema validation, etc).
    pub const ALL: &'static [FlagKey] = &[
        FlagKey::Hostname,
        FlagKey::EnrollSecret,
        FlagKey::EnrollSecretPath,
        FlagKey::RootDirectory,
        FlagKey::OsquerydPath,
        FlagKey::LoggingInterval,
        FlagKey::ControlRequestInterval,
        FlagKey::InsecureTls,
        FlagKey::InsecureTransport,
        FlagKey::Autoupdate,
        FlagKey::UpdateChannel,
        FlagKey::AutoupdateInterval,
        FlagKey::AutoupdateInitialDelay,
        FlagKey::UseTufAutoupdater,
        FlagKey::PinnedLauncherVersion,
        FlagKey::PinnedOsqueryVersion,
        FlagKey::WatchdogEnabled,
        FlagKey::WatchdogDelaySeconds,
        FlagKey::WatchdogMemoryMb,
        FlagKey::WatchdogCpuUtilizationPercent,
        FlagKey::TraceExportEnabled,
        FlagKey::TraceSamplingRate,
        FlagKey::TraceBatchTimeout,
        FlagKey::LogIngestUrl,
        FlagKey::TraceIngestUrl,
        FlagKey::DesktopEnabled,
        FlagKey::DesktopUpdateInterval,
        FlagKey::DesktopMenuRefreshInterval,
        FlagKey::OsqueryHealthcheckStartupDelay,
        FlagKey::LogShippingLevel,
        FlagKey::AllowedExtensions,
        FlagKey::OsqueryFlags,
        FlagKey::CertPins,
    ];

    /// The stable wire name used in the KV store and the control-server
    /// bulk-update map. Must round-trip through [`FlagKey::parse`].
    pub const fn as_str(self) -> &'static str {
        match self {
            FlagKey::Hostname => "hostname",
            FlagKey::EnrollSecret => "enroll_secret",
            FlagKey::EnrollSecretPath => "enroll_secret_path",
            FlagKey::RootDirectory => "root_directory",
            FlagKey::OsquerydPath => "osqueryd_path",
            FlagKey::LoggingInterval => "logging_interval",
            FlagKey::ControlRequestInterval => "control_request_interval",
            FlagKey::InsecureTls => "insecure_tls",
            FlagKey::InsecureTransport => "insecure_transport",
            FlagKey::Autoupdate => "autoupdate",
            FlagKey::UpdateChannel => "update_channel",
            FlagKey::AutoupdateInterval => "autoupdate_interval",
            FlagKey::AutoupdateInitialDelay => "autoupdate_initial_delay",
            FlagKey::UseTufAutoupdater => "use_tuf_autoupdater",
            FlagKey::PinnedLauncherVersion => "pinned_launcher_version",
            FlagKey::PinnedOsqueryVersion => "pinned_osquery_version",
            FlagKey::WatchdogEnabled => "watchdog_enabled",
            FlagKey::WatchdogDelaySeconds => "watchdog_delay_seconds",
            FlagKey::WatchdogMemoryMb => "watchdog_memory_mb",
            FlagKey::WatchdogCpuUtilizationPercent => "watchdog_cpu_utilization_percent",
            FlagKey::TraceExportEnabled => "trace_export_enabled",
            FlagKey::TraceSamplingRate => "trace_sampling_rate",
            FlagKey::TraceBatchTimeout => "trace_batch_timeout",
            FlagKey::LogIngestUrl => "log_ingest_url",
            FlagKey::TraceIngestUrl => "trace_ingest_url",
            FlagKey::DesktopEnabled => "desktop_enabled",
            FlagKey::DesktopUpdateInterval => "desktop_update_interval",
            FlagKey::DesktopMenuRefreshInterval => "desktop_menu_refresh_interval",
            FlagKey::OsqueryHealthcheckStartupDelay => "osquery_healthcheck_startup_delay",
            FlagKey::LogShippingLevel => "log_shipping_level",
            FlagKey::AllowedExtensions => "allowed_extensions",
            FlagKey::OsqueryFlags => "osquery_flags",
            FlagKey::CertPins => "cert_pins",
        }
    }

    /// Parse a wire name back into a key. Unknown names are not an error at
    /// this layer: a bulk update from a newer control server may carry keys
    /// this build doesn't understand yet, and those are simply ignored by
    /// the caller.
    pub fn parse(name: &str) -> Option<FlagKey> {
        FlagKey::ALL.iter().copied().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for FlagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

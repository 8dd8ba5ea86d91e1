//! The command-line options struct: compile-time defaults for every flag key.
//!
//! Populated by an external parser (out of scope here — see the crate's
//! module docs) and handed to [`crate::controller::FlagController`] by value
//! or reference at construction time. `flagcore` never reads argv or the
//! process environment itself.

use std::time::Duration;

/// One field per flag key that has a compile-time default. Immutable once
/// constructed; the controller never mutates it.
#[derive(Clone, Debug)]
pub struct Options {
    pub hostname: String,
    pub enroll_secret: String,
    pub enroll_secret_path: String,
    pub root_directory: String,
    pub osqueryd_path: String,

    pub logging_interval: Duration,
    pub control_request_interval: Duration,

    pub insecure_tls: bool,
    pub insecure_transport: bool,

    pub autoupdate: bool,
    pub update_channel: String,
    pub autoupdate_interval: Duration,
    pub autoupdate_initial_delay: Duration,
    pub use_tuf_autoupdater: bool,
    pub pinned_launcher_version: String,
    pub pinned_osquery_version: String,

    pub watchdog_enabled: bool,
    pub watchdog_delay_seconds: i64,
    pub watchdog_memory_mb: i64,
    pub watchdog_cpu_utilization_percent: i64,

    pub trace_export_enabled: bool,
    pub trace_sampling_rate: f64,
    pub trace_batch_timeout: Duration,

    pub log_ingest_url: String,
    pub trace_ingest_url: String,

    pub desktop_enabled: bool,
    pub desktop_update_interval: Duration,
    pub desktop_menu_refresh_interval: Duration,

    pub osquery_healthcheck_startup_delay: Duration,
    pub log_shipping_level: String,

    /// No remote override path; the controller returns this slice directly.
    pub allowed_extensions: Vec<String>,
    pub osquery_flags: Vec<String>,
    pub cert_pins: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            enroll_secret: String::new(),
            enroll_secret_path: String::new(),
            root_directory: String::from("."),
            osqueryd_path: String::new(),

            logging_interval: Duration::from_secs(60),
            control_request_interval: Duration::from_secs(60),

            insecure_tls: false,
            insecure_transport: false,

            autoupdate: false,
            update_channel: String::from("stable"),
            autoupdate_interval: Duration::from_secs(3600),
            autoupdate_initial_delay: Duration::from_secs(60),
            use_tuf_autoupdater: true,
            pinned_launcher_version: String::new(),
            pinned_osquery_version: String::new(),

            watchdog_enabled: true,
            watchdog_delay_seconds: 30,
            watchdog_memory_mb: 150,
            watchdog_cpu_utilization_percent: 20,

            trace_export_enabled: false,
            trace_sampling_rate: 0.0,
            trace_batch_timeout: Duration::from_secs(5),

            log_ingest_url: String::new(),
            trace_ingest_url: String::new(),

            desktop_enabled: false,
            desktop_update_interval: Duration::from_secs(5),
            desktop_menu_refresh_interval: Duration::from_secs(300),

            osquery_healthcheck_startup_delay: Duration::ZERO,
            log_shipping_level: String::from("info"),

            allowed_extensions: Vec::new(),
            osquery_flags: Vec::new(),
            cert_pins: Vec::new(),
        }
    }
}

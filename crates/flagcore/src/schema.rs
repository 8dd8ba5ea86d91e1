//! Per-key clamp tables and sanitizers (§6's authoritative clamp table and
//! §4.2's sanitizer step).
//!
//! These are static, compile-time-known facts about a key, independent of
//! any particular [`crate::options::Options`] instance — the default comes
//! from `Options`, but the clamp bounds and sanitizer behavior do not.

use std::time::Duration;

/// An inclusive `[min, max]` bound applied after override/remote resolution.
#[derive(Clone, Copy, Debug)]
pub struct Clamp<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Clamp<T> {
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn apply(&self, value: T) -> T {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }
}

pub const LOGGING_INTERVAL: Clamp<Duration> =
    Clamp::new(Duration::from_secs(5), Duration::from_secs(600));
pub const CONTROL_REQUEST_INTERVAL: Clamp<Duration> =
    Clamp::new(Duration::from_secs(5), Duration::from_secs(600));
pub const DESKTOP_UPDATE_INTERVAL: Clamp<Duration> =
    Clamp::new(Duration::from_secs(5), Duration::from_secs(600));
pub const DESKTOP_MENU_REFRESH_INTERVAL: Clamp<Duration> =
    Clamp::new(Duration::from_secs(300), Duration::from_secs(3600));
pub const AUTOUPDATE_INTERVAL: Clamp<Duration> =
    Clamp::new(Duration::from_secs(60), Duration::from_secs(86400));
pub const AUTOUPDATE_INITIAL_DELAY: Clamp<Duration> =
    Clamp::new(Duration::from_secs(5), Duration::from_secs(43200));
pub const TRACE_BATCH_TIMEOUT: Clamp<Duration> =
    Clamp::new(Duration::from_secs(5), Duration::from_secs(3600));
pub const OSQUERY_HEALTHCHECK_STARTUP_DELAY: Clamp<Duration> =
    Clamp::new(Duration::ZERO, Duration::from_secs(3600));

pub const TRACE_SAMPLING_RATE: Clamp<f64> = Clamp::new(0.0, 1.0);

pub const WATCHDOG_DELAY_SECONDS: Clamp<i64> = Clamp::new(0, 600);
pub const WATCHDOG_MEMORY_MB: Clamp<i64> = Clamp::new(100, 10_000);
pub const WATCHDOG_CPU_UTILIZATION_PERCENT: Clamp<i64> = Clamp::new(5, 100);

/// Allowlisted update channels; an unrecognized value resets to `fallback`
/// (the key's default) rather than being stored verbatim.
const UPDATE_CHANNELS: &[&str] = &["stable", "beta", "alpha", "nightly"];

pub fn sanitize_update_channel(raw: &str, fallback: &str) -> String {
    let lowered = raw.trim().to_ascii_lowercase();
    if UPDATE_CHANNELS.contains(&lowered.as_str()) {
        lowered
    } else {
        fallback.to_string()
    }
}

/// Allowlisted log shipping levels; an unrecognized value resets to
/// `fallback` (§4.2: "log-level allowlist reset-to-default on unknown").
const LOG_SHIPPING_LEVELS: &[&str] = &["debug", "info", "warn", "error"];

pub fn sanitize_log_shipping_level(raw: &str, fallback: &str) -> String {
    let lowered = raw.trim().to_ascii_lowercase();
    if LOG_SHIPPING_LEVELS.contains(&lowered.as_str()) {
        lowered
    } else {
        fallback.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_applies_both_bounds() {
        let clamp = Clamp::new(5i64, 100i64);
        assert_eq!(clamp.apply(-3), 5);
        assert_eq!(clamp.apply(50), 50);
        assert_eq!(clamp.apply(500), 100);
    }

    #[test]
    fn duration_clamp_matches_authoritative_table() {
        assert_eq!(
            LOGGING_INTERVAL.apply(Duration::from_secs(2)),
            Duration::from_secs(5)
        );
        assert_eq!(
            LOGGING_INTERVAL.apply(Duration::from_secs(120)),
            Duration::from_secs(120)
        );
    }

    #[test]
    fn unknown_update_channel_resets_to_fallback() {
        assert_eq!(sanitize_update_channel("Beta", "stable"), "beta");
        assert_eq!(sanitize_update_channel("nope", "stable"), "stable");
    }

    #[test]
    fn unknown_log_level_resets_to_fallback() {
        assert_eq!(sanitize_log_shipping_level("WARN", "info"), "warn");
        assert_eq!(sanitize_log_shipping_level("verbose", "info"), "info");
    }
}

//! Typed per-read resolution (§4.2): default → remote bytes → override →
//! clamp → sanitize, re-evaluated on every call so hot-reload and override
//! expiry need no cache invalidation.

use std::time::Duration;

use crate::key::FlagKey;
use crate::schema::Clamp;
use crate::value::EncodedValue;
use crate::value::TypedValue;

pub fn resolve_bool(
    key: FlagKey,
    default: bool,
    remote: Option<&EncodedValue>,
    override_value: Option<&TypedValue>,
) -> bool {
    let mut result = default;
    if let Some(bytes) = remote {
        result = bytes.decode_bool();
    }
    if let Some(ov) = override_value {
        match ov.as_bool() {
            Some(v) => result = v,
            None => tracing::debug!(%key, "override dynamic type mismatch, ignoring"),
        }
    }
    result
}

pub fn resolve_int(
    key: FlagKey,
    default: i64,
    clamp: Clamp<i64>,
    remote: Option<&EncodedValue>,
    override_value: Option<&TypedValue>,
) -> i64 {
    let mut result = default;
    if let Some(bytes) = remote {
        match bytes.decode_int() {
            Ok(v) => result = v,
            Err(error) => tracing::debug!(%key, %error, "decode failed, keeping default"),
        }
    }
    if let Some(ov) = override_value {
        match ov.as_int() {
            Some(v) => result = v,
            None => tracing::debug!(%key, "override dynamic type mismatch, ignoring"),
        }
    }
    clamp.apply(result)
}

pub fn resolve_float(
    key: FlagKey,
    default: f64,
    clamp: Clamp<f64>,
    remote: Option<&EncodedValue>,
    override_value: Option<&TypedValue>,
) -> f64 {
    let mut result = default;
    if let Some(bytes) = remote {
        match bytes.decode_float() {
            Ok(v) => result = v,
            Err(error) => tracing::debug!(%key, %error, "decode failed, keeping default"),
        }
    }
    if let Some(ov) = override_value {
        match ov.as_float() {
            Some(v) => result = v,
            None => tracing::debug!(%key, "override dynamic type mismatch, ignoring"),
        }
    }
    clamp.apply(result)
}

pub fn resolve_duration(
    key: FlagKey,
    default: Duration,
    clamp: Clamp<Duration>,
    remote: Option<&EncodedValue>,
    override_value: Option<&TypedValue>,
) -> Duration {
    let mut result = default;
    if let Some(bytes) = remote {
        match bytes.decode_duration() {
            Ok(v) => result = v,
            Err(error) => tracing::debug!(%key, %error, "decode failed, keeping default"),
        }
    }
    if let Some(ov) = override_value {
        match ov.as_duration() {
            Some(v) => result = v,
            None => tracing::debug!(%key, "override dynamic type mismatch, ignoring"),
        }
    }
    clamp.apply(result)
}

pub fn resolve_string(
    key: FlagKey,
    default: &str,
    sanitizer: Option<fn(&str, &str) -> String>,
    remote: Option<&EncodedValue>,
    override_value: Option<&TypedValue>,
) -> String {
    let mut result = default.to_string();
    if let Some(bytes) = remote {
        match bytes.decode_string() {
            Ok(v) => result = v,
            Err(error) => tracing::debug!(%key, %error, "decode failed, keeping default"),
        }
    }
    if let Some(ov) = override_value {
        match ov.as_str() {
            Some(v) => result = v.to_string(),
            None => tracing::debug!(%key, "override dynamic type mismatch, ignoring"),
        }
    }
    if let Some(sanitize) = sanitizer {
        result = sanitize(&result, default);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    #[test]
    fn duration_accepts_nanoseconds_literal_and_falls_back_on_garbage() {
        let default = Duration::from_secs(60);
        let clamp = schema::LOGGING_INTERVAL;

        let nanos = EncodedValue::from_bytes(b"120000000000".to_vec());
        assert_eq!(
            resolve_duration(FlagKey::LoggingInterval, default, clamp, Some(&nanos), None),
            Duration::from_secs(120)
        );

        let literal = EncodedValue::from_bytes(b"4s".to_vec());
        assert_eq!(
            resolve_duration(FlagKey::LoggingInterval, default, clamp, Some(&literal), None),
            Duration::from_secs(5) // clamped up to the 5s floor
        );

        let garbage = EncodedValue::from_bytes(b"NOT A NUMBER".to_vec());
        assert_eq!(
            resolve_duration(FlagKey::LoggingInterval, default, clamp, Some(&garbage), None),
            default
        );
    }

    #[test]
    fn duration_clamps_a_tighter_bound() {
        let default = Duration::from_secs(60);
        let tight = Clamp::new(Duration::from_secs(60), Duration::from_secs(600));
        let thirty_seconds = EncodedValue::encode_duration(Duration::from_secs(30));
        assert_eq!(
            resolve_duration(
                FlagKey::LoggingInterval,
                default,
                tight,
                Some(&thirty_seconds),
                None
            ),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn override_takes_precedence_over_remote_and_default() {
        let default = Duration::from_secs(60);
        let remote = EncodedValue::encode_duration(Duration::from_secs(90));
        let override_value = TypedValue::Duration(Duration::from_secs(120));
        assert_eq!(
            resolve_duration(
                FlagKey::LoggingInterval,
                default,
                schema::LOGGING_INTERVAL,
                Some(&remote),
                Some(&override_value)
            ),
            Duration::from_secs(120)
        );
    }

    #[test]
    fn mismatched_override_type_is_ignored() {
        let default = Duration::from_secs(60);
        let override_value = TypedValue::Bool(true);
        assert_eq!(
            resolve_duration(
                FlagKey::LoggingInterval,
                default,
                schema::LOGGING_INTERVAL,
                None,
                Some(&override_value)
            ),
            default
        );
    }

    #[test]
    fn string_sanitizer_resets_unknown_values_to_default() {
        let result = resolve_string(
            FlagKey::UpdateChannel,
            "stable",
            Some(schema::sanitize_update_channel),
            Some(&EncodedValue::encode_string("not-a-channel")),
            None,
        );
        assert_eq!(result, "stable");
    }
}

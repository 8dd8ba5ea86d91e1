//! Wire encoding for flag values.
//!
//! The encoding is fixed per logical type so that bytes produced by
//! [`crate::controller::FlagController`]'s setters are consumed correctly by
//! the matching [`crate::resolver`]. See the per-type rules on
//! [`EncodedValue`]'s methods.

use std::time::Duration;

/// An opaque byte sequence as stored in the KV store.
///
/// Wraps a `Vec<u8>` rather than re-using `Vec<u8>` directly so that encode/
/// decode stays centralized on this type instead of scattered across call
/// sites.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedValue(pub Vec<u8>);

impl EncodedValue {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// `"enabled"` for true, empty sequence for false.
    pub fn encode_bool(value: bool) -> Self {
        if value {
            Self(b"enabled".to_vec())
        } else {
            Self(Vec::new())
        }
    }

    /// Any byte sequence other than exactly `"enabled"` decodes to `false`;
    /// there is no decode-failure case for booleans.
    pub fn decode_bool(&self) -> bool {
        self.0 == b"enabled"
    }

    /// Decimal ASCII.
    pub fn encode_int(value: i64) -> Self {
        Self(value.to_string().into_bytes())
    }

    pub fn decode_int(&self) -> Result<i64, DecodeError> {
        std::str::from_utf8(&self.0)
            .ok()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .ok_or(DecodeError::Int)
    }

    /// Shortest round-trip decimal ASCII (Rust's `f64::to_string` already
    /// produces the shortest representation that parses back exactly).
    pub fn encode_float(value: f64) -> Self {
        Self(value.to_string().into_bytes())
    }

    pub fn decode_float(&self) -> Result<f64, DecodeError> {
        std::str::from_utf8(&self.0)
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .ok_or(DecodeError::Float)
    }

    /// Writers always emit nanoseconds, for forward compatibility with
    /// readers that only understand integers.
    pub fn encode_duration(value: Duration) -> Self {
        Self(value.as_nanos().to_string().into_bytes())
    }

    /// Readers accept either a duration literal (`"4s"`, `"1h30m45s"`) or a
    /// decimal integer nanosecond count.
    pub fn decode_duration(&self) -> Result<Duration, DecodeError> {
        let text = std::str::from_utf8(&self.0).map_err(|_| DecodeError::Duration)?;
        let text = text.trim();
        if let Ok(nanos) = text.parse::<u64>() {
            return Ok(Duration::from_nanos(nanos));
        }
        humantime::parse_duration(text).map_err(|_| DecodeError::Duration)
    }

    /// Raw bytes, interpreted as UTF-8.
    pub fn encode_string(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }

    pub fn decode_string(&self) -> Result<String, DecodeError> {
        String::from_utf8(self.0.clone()).map_err(|_| DecodeError::Utf8)
    }
}

/// Bytes in the store did not parse as the expected logical type.
///
/// Never surfaced to a controller caller: resolvers catch this, log at
/// debug, and fall back to the key's default (§7 of the design).
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("stored bytes are not valid UTF-8")]
    Utf8,
    #[error("stored bytes are not a decimal integer")]
    Int,
    #[error("stored bytes are not a decimal float")]
    Float,
    #[error("stored bytes are not a duration literal or nanosecond count")]
    Duration,
}

/// A typed override value, checked against the resolver's expected dynamic
/// type at read time (§4.2 step 3 / §7 "override type mismatches").
#[derive(Clone, Debug, PartialEq)]
pub enum TypedValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Duration(Duration),
    String(String),
}

impl TypedValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            TypedValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            TypedValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            TypedValue::Duration(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::String(v) => Some(v.as_str()),
            _ => None,
        }
    }
}

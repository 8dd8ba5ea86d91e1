//! Error types for the flag configuration core.
//!
//! Only store-boundary operations return errors to their caller. Everything
//! above the store (resolution, overrides, notification) degrades silently
//! toward a default per the propagation policy in the design notes: decode
//! failures, clamp violations, override type mismatches and observer panics
//! never reach `set`/`update`'s caller.

use thiserror::Error;

/// Failures from the embedded SQLite-backed store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("store file io error at `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("store opened read-only, write rejected")]
    ReadOnly,
}

/// Errors surfaced by [`crate::controller::FlagController`].
///
/// Per the propagation policy, this is the *only* error type the controller's
/// public `set_*`/`update` methods return.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("flag store operation failed: {0}")]
    Store(#[from] StoreError),
}

/// Errors from startup-mirror writer construction.
///
/// A store-open failure here is fatal to the writer and propagated to its
/// caller; a later refresh failure (after construction) is logged at `warn`
/// and swallowed instead, since the next flag change retries it.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to open startup settings store: {0}")]
    Open(#[from] StoreError),
}

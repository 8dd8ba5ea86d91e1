//! Configuration and settings core for an endpoint management agent.
//!
//! Three pieces, built bottom-up from a durable SQLite-backed store:
//!
//! - [`store`] — the durable `name -> value` map with atomic bulk
//!   replace-set, and the timestamped append-log variant.
//! - [`resolver`] and [`override_registry`] — typed per-read resolution
//!   (default → remote → override → clamp → sanitize) and bounded-lifetime
//!   in-memory overrides.
//! - [`controller::FlagController`] — the facade most callers use: one
//!   typed getter/setter per flag key, wired to the store, the overrides,
//!   and the [`observer`] registry.
//! - [`startup`] — a cross-process durable mirror of a curated flag subset,
//!   read by sibling processes that start before the controller exists.
//!
//! This crate performs no network I/O, does not broker secrets, and does
//! not validate semantic relationships between flags; it resolves,
//! persists, and notifies.

pub mod clock;
pub mod controller;
pub mod error;
pub mod key;
pub mod observer;
pub mod options;
pub mod override_registry;
pub mod resolver;
pub mod schema;
pub mod startup;
pub mod store;
pub mod value;

pub use controller::FlagController;
pub use error::{ConfigError, StartupError, StoreError};
pub use key::FlagKey;
pub use observer::Observer;
pub use options::Options;
pub use value::{EncodedValue, TypedValue};

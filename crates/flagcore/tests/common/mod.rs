//! Shared scenario-test plumbing.

/// Installs a `tracing` subscriber once per test binary so failures print
/// the debug/warn logs the core emits, instead of running silently. Safe to
/// call from every test; only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

//! S6 — startup mirror consistency: the writer mirrors a curated flag
//! subset into a durable, cross-process-readable store, and re-running
//! `write_settings()` after a flag change keeps the mirror an exact
//! reflection of the controller — including deleting rows for keys that
//! fell out of the curated subset.

use std::sync::Arc;

use flagcore::startup::{CuratedEntry, StartupSettingsReader, StartupSettingsWriter};
use flagcore::{FlagController, FlagKey, Options};
use tempfile::TempDir;

mod common;

fn curated() -> Vec<CuratedEntry> {
    vec![
        (FlagKey::UpdateChannel, |c: &FlagController| c.update_channel()),
        (FlagKey::UseTufAutoupdater, |c: &FlagController| {
            if c.use_tuf_autoupdater() {
                "enabled".to_string()
            } else {
                String::new()
            }
        }),
    ]
}

#[test]
fn mirror_tracks_the_controller_across_a_flag_change() {
    common::init_tracing();
    let dir = TempDir::new().unwrap();
    let mut options = Options::default();
    options.root_directory = dir.path().to_string_lossy().to_string();
    options.update_channel = "beta".to_string();
    options.use_tuf_autoupdater = true;
    let controller = Arc::new(FlagController::open(options).unwrap());

    let writer = StartupSettingsWriter::open(dir.path(), controller.clone(), curated()).unwrap();

    let reader = StartupSettingsReader::open(dir.path()).unwrap();
    assert_eq!(reader.get(FlagKey::UpdateChannel).as_deref(), Some("beta"));
    assert_eq!(
        reader.get(FlagKey::UseTufAutoupdater).as_deref(),
        Some("enabled")
    );

    controller.set_update_channel("alpha").unwrap();
    controller.set_use_tuf_autoupdater(false).unwrap();

    assert_eq!(reader.get(FlagKey::UpdateChannel).as_deref(), Some("alpha"));
    assert_eq!(reader.get(FlagKey::UseTufAutoupdater).as_deref(), Some(""));

    drop(writer);
}

#[test]
fn a_sibling_process_can_read_the_mirror_before_the_writer_ever_runs() {
    common::init_tracing();
    let dir = TempDir::new().unwrap();
    // No writer has opened this root yet; a sibling reader must fail
    // cleanly rather than create the file itself.
    assert!(StartupSettingsReader::open(dir.path()).is_err());
}

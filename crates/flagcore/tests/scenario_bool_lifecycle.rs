//! S1 — bool lifecycle: default false, set(true)/set(false) round-trip
//! through the exact wire encoding (`"enabled"` / empty).

use flagcore::store::SqliteKvStore;
use flagcore::{FlagController, Options};
use tempfile::TempDir;

mod common;

fn open(dir: &TempDir) -> FlagController {
    let mut options = Options::default();
    options.root_directory = dir.path().to_string_lossy().to_string();
    options.desktop_enabled = false;
    FlagController::open(options).unwrap()
}

#[test]
fn bool_lifecycle() {
    common::init_tracing();
    let dir = TempDir::new().unwrap();
    let controller = open(&dir);

    assert!(!controller.desktop_enabled());

    controller.set_desktop_enabled(true).unwrap();
    assert!(controller.desktop_enabled());

    let reader = SqliteKvStore::open_read_only(&dir.path().join("kv.sqlite"), "flags").unwrap();
    assert_eq!(
        reader.get("desktop_enabled").unwrap().unwrap().as_bytes(),
        b"enabled"
    );

    controller.set_desktop_enabled(false).unwrap();
    assert!(!controller.desktop_enabled());
    assert_eq!(
        reader.get("desktop_enabled").unwrap().unwrap().as_bytes(),
        b""
    );
}

//! Cross-process Startup Settings (§4.6): a durable mirror of a curated
//! flag subset, written by the main agent process and read by sibling
//! processes that start before the controller is available to them.

mod reader;
mod writer;

pub use reader::StartupSettingsReader;
pub use writer::{CuratedEntry, ExtraEntriesFn, StartupSettingsWriter};

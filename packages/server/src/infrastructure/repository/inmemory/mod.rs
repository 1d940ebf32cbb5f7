//! In-memory stores, used by the server binary and tests.

pub mod history;
pub mod parameters;

pub use history::InMemoryHistoryStore;
pub use parameters::{InMemoryParameterStore, load_presets, parse_presets};

//! Store implementations.

pub mod inmemory;

pub use inmemory::{InMemoryHistoryStore, InMemoryParameterStore, load_presets};

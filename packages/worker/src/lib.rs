//! Colony reference worker node.
//!
//! Joins a room, evolves every assigned population slice by one generation
//! with a small built-in strategy catalogue and returns the result.

pub mod error;
pub mod evolve;
pub mod runner;
pub mod session;
pub mod strategy;

pub use error::WorkerError;
pub use runner::{ReconnectPolicy, WorkerConfig, run_worker};

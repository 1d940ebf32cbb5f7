//! Colony room orchestrator.
//!
//! Coordinates a generation-based genetic algorithm across a dynamic set of
//! WebSocket worker nodes, grouped into rooms and observed by admin connections.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

//! UseCase layer: room orchestration, the session registry, presets and history.

pub mod error;
pub mod history;
pub mod orchestrator;
pub mod parameters;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ConnectError, OrchestratorError, ParameterError};
pub use history::HistoryUseCase;
pub use orchestrator::{OrchestratorContext, RoomOrchestrator};
pub use parameters::ParameterUseCase;
pub use registry::SessionRegistry;

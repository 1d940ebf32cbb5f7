//! Error types for the worker.

use thiserror::Error;

/// Worker-specific errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkerError {
    /// Client ID is already in use
    #[error("Client ID '{0}' is already connected")]
    DuplicateClientId(String),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// An established session was lost
    #[error("Disconnected: {0}")]
    Disconnected(String),

    /// A task names a strategy this worker does not implement
    #[error("unknown {kind} strategy '{name}'")]
    UnknownStrategy { kind: &'static str, name: String },

    /// A strategy body could not be interpreted
    #[error("invalid {kind} strategy body: {reason}")]
    InvalidStrategy { kind: &'static str, reason: String },

    #[error("task carries an empty population")]
    EmptyPopulation,
}

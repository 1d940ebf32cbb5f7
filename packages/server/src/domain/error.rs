//! Domain error types.

use thiserror::Error;

/// Invalid value object input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{kind} must be at most {max} characters")]
    TooLong { kind: &'static str, max: usize },

    #[error("{0} must not contain whitespace or control characters")]
    InvalidCharacter(&'static str),
}

/// Malformed input rejected before any state is touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("finished task carries no fitnesses")]
    EmptyFitnesses,

    #[error("finished task has {population} chromosomes but {fitnesses} fitnesses")]
    LengthMismatch { population: usize, fitnesses: usize },

    #[error("fitness at index {index} is not a finite number")]
    NonFiniteFitness { index: usize },

    #[error("invalid job parameters: {0}")]
    InvalidParameters(String),

    #[error("no job parameters stored for room '{0}'")]
    MissingParameters(String),

    #[error(transparent)]
    InvalidIdentifier(#[from] ValueObjectError),
}

/// Event that is well-formed but not acceptable in the room's current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("a job is already running in room '{0}'")]
    JobAlreadyRunning(String),

    #[error("room '{0}' does not exist")]
    UnknownRoom(String),

    #[error("no job is running in room '{0}'")]
    JobNotRunning(String),

    #[error("result for job {received} ignored, room '{room}' is running job {current}")]
    StaleResult {
        room: String,
        received: u64,
        current: u64,
    },

    #[error("'{node}' is not a node of room '{room}'")]
    UnknownNode { room: String, node: String },
}

/// Persistence failure in one of the stores.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt store data: {0}")]
    Corrupt(String),
}

/// Delivery failure towards a connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("client '{0}' is not connected")]
    ClientNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),

    #[error("failed to encode message: {0}")]
    EncodeFailed(String),
}

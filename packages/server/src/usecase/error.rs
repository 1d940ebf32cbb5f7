//! UseCase layer error types.

use thiserror::Error;

use crate::domain::{ProtocolError, RepositoryError, RoomError, ValidationError};

/// Connection rejected before the socket is upgraded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("client '{0}' is already connected")]
    DuplicateClientId(String),
}

/// Inbound room event that was not applied.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Store(#[from] RepositoryError),
}

impl From<RoomError> for OrchestratorError {
    fn from(error: RoomError) -> Self {
        match error {
            RoomError::Validation(e) => Self::Validation(e),
            RoomError::Protocol(e) => Self::Protocol(e),
        }
    }
}

impl From<ParameterError> for OrchestratorError {
    fn from(error: ParameterError) -> Self {
        match error {
            ParameterError::Invalid(e) => Self::Validation(e),
            ParameterError::Store(e) => Self::Store(e),
        }
    }
}

/// Failure reading or writing a parameter preset.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] RepositoryError),
}

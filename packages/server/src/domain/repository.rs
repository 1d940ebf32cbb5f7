//! Store interfaces required by the domain.
//!
//! Concrete implementations live in the infrastructure layer.

use async_trait::async_trait;

use super::{
    entity::{HistoryRecord, JobParameters},
    error::RepositoryError,
    value_object::RoomId,
};

/// Append-only log of completed runs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, record: HistoryRecord) -> Result<(), RepositoryError>;

    /// All runs recorded for a room, in insertion order.
    async fn list(&self, room: &RoomId) -> Result<Vec<HistoryRecord>, RepositoryError>;
}

/// Job parameter presets keyed by room.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ParameterStore: Send + Sync {
    async fn get(&self, room: &RoomId) -> Result<Option<JobParameters>, RepositoryError>;

    async fn put(&self, room: RoomId, parameters: JobParameters) -> Result<(), RepositoryError>;

    async fn list(&self) -> Result<Vec<(RoomId, JobParameters)>, RepositoryError>;
}

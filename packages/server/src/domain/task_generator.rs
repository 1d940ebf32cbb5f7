//! Task generation strategy consumed by the room state machine.

use std::sync::Arc;

use super::{
    entity::{JobConfig, Task},
    value_object::{JobId, RoomId},
};

/// What every task of one generated batch shares.
#[derive(Debug, Clone, Copy)]
pub struct TaskBatch<'a> {
    pub room: &'a RoomId,
    pub job: JobId,
    pub generation: u32,
    pub config: &'a Arc<JobConfig>,
}

/// Splits or replicates population work into task descriptors.
///
/// Implementations must return exactly `count` tasks.
pub trait TaskGenerator: Send + Sync {
    fn generate(&self, batch: TaskBatch<'_>, count: usize) -> Vec<Task>;
}

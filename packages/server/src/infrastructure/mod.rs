//! Infrastructure layer: store implementations, transport adapter, task generation and DTOs.

pub mod dto;
pub mod message_pusher;
pub mod repository;
pub mod task_generator;

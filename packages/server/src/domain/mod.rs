//! Domain layer: room state machine, entities and the interfaces it depends on.

pub mod bucket;
pub mod entity;
pub mod error;
pub mod event;
pub mod message_pusher;
pub mod repository;
pub mod room;
pub mod task_generator;
pub mod value_object;

pub use bucket::{Bucket, BucketEntry, fittest_index};
pub use entity::{
    FinishedTask, HistoryRecord, JobConfig, JobOutcome, JobParameters, Node, StrategyRef, Task,
};
pub use error::{
    MessagePushError, ProtocolError, RepositoryError, ValidationError, ValueObjectError,
};
pub use event::{RoomEvent, RoomEventKind};
pub use message_pusher::{MessagePusher, Notification, PusherChannel};
pub use repository::{HistoryStore, ParameterStore};
pub use room::{Effect, RoomError, RoomPhase, RoomSnapshot, RoomState};
pub use task_generator::{TaskBatch, TaskGenerator};
pub use value_object::{Chromosome, ClientId, JobId, RoomId, Timestamp};

//! Inbound events, as routed to a room.

use super::{
    entity::{FinishedTask, JobParameters},
    value_object::RoomId,
};

/// One inbound message from a connection, addressed to a room.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomEvent {
    pub room: RoomId,
    pub kind: RoomEventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoomEventKind {
    Join,
    Leave,
    AdminJoin,
    /// Start a job; without parameters the room's stored preset is used.
    Start {
        parameters: Option<JobParameters>,
    },
    Done(FinishedTask),
    JobError {
        error: String,
    },
    Abort,
    RequestRoom,
}

impl RoomEventKind {
    /// Event name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Leave => "leave",
            Self::AdminJoin => "admin-join",
            Self::Start { .. } => "start",
            Self::Done(_) => "done",
            Self::JobError { .. } => "job-error",
            Self::Abort => "abort",
            Self::RequestRoom => "request-room",
        }
    }

    /// Whether the event may create the room it addresses.
    pub fn creates_room(&self) -> bool {
        matches!(self, Self::Join | Self::AdminJoin)
    }
}

//! Outbound delivery interface (transport adapter).

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{
    entity::{HistoryRecord, JobOutcome, Task},
    error::MessagePushError,
    room::RoomSnapshot,
    value_object::{ClientId, RoomId},
};

/// Channel feeding one connection's outbound writer.
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// Messages the orchestrator sends to connections.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Unicast work assignment.
    Assign(Task),
    /// Room state for admins (or a one-shot reply to `request-room`).
    RoomUpdate(RoomSnapshot),
    Aborted { room: RoomId },
    JobFinished(JobOutcome),
    /// Run history of a room, newest first.
    HistoryUpdate {
        room: RoomId,
        records: Vec<HistoryRecord>,
    },
    /// Reply to the sender of an event that was not accepted.
    Rejected {
        room: Option<RoomId>,
        reason: String,
    },
}

#[async_trait]
pub trait MessagePusher: Send + Sync {
    async fn register_client(&self, client_id: ClientId, sender: PusherChannel);

    async fn unregister_client(&self, client_id: &ClientId);

    async fn push_to(
        &self,
        client_id: &ClientId,
        notification: &Notification,
    ) -> Result<(), MessagePushError>;

    /// Best-effort delivery; missing targets are skipped.
    async fn broadcast(
        &self,
        targets: Vec<ClientId>,
        notification: &Notification,
    ) -> Result<(), MessagePushError>;
}

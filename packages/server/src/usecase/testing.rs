//! Test doubles shared by the usecase tests.

use std::{sync::Mutex, time::Duration};

use async_trait::async_trait;

use crate::domain::{
    ClientId, MessagePushError, MessagePusher, Notification, PusherChannel, RoomSnapshot, Task,
};

/// `MessagePusher` that keeps every notification instead of sending it.
#[derive(Default)]
pub struct RecordingPusher {
    sent: Mutex<Vec<(ClientId, Notification)>>,
}

impl RecordingPusher {
    pub fn sent_to(&self, client: &ClientId) -> Vec<Notification> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| to == client)
            .map(|(_, n)| n.clone())
            .collect()
    }

    pub fn assignments_to(&self, client: &ClientId) -> Vec<Task> {
        self.sent_to(client)
            .into_iter()
            .filter_map(|n| match n {
                Notification::Assign(task) => Some(task),
                _ => None,
            })
            .collect()
    }

    pub fn snapshots_to(&self, client: &ClientId) -> Vec<RoomSnapshot> {
        self.sent_to(client)
            .into_iter()
            .filter_map(|n| match n {
                Notification::RoomUpdate(snapshot) => Some(snapshot),
                _ => None,
            })
            .collect()
    }

    /// Polls for up to one second; for notifications sent from spawned tasks.
    pub async fn wait_until(&self, predicate: impl Fn(&(ClientId, Notification)) -> bool) -> bool {
        for _ in 0..100 {
            if self.sent.lock().unwrap().iter().any(&predicate) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

#[async_trait]
impl MessagePusher for RecordingPusher {
    async fn register_client(&self, _client_id: ClientId, _sender: PusherChannel) {}

    async fn unregister_client(&self, _client_id: &ClientId) {}

    async fn push_to(
        &self,
        client_id: &ClientId,
        notification: &Notification,
    ) -> Result<(), MessagePushError> {
        self.sent
            .lock()
            .unwrap()
            .push((client_id.clone(), notification.clone()));
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: Vec<ClientId>,
        notification: &Notification,
    ) -> Result<(), MessagePushError> {
        let mut sent = self.sent.lock().unwrap();
        for target in targets {
            sent.push((target, notification.clone()));
        }
        Ok(())
    }
}

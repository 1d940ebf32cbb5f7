//! In-memory run history.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{HistoryRecord, HistoryStore, RepositoryError, RoomId};

/// History store backed by a `HashMap` of per-room logs.
#[derive(Default)]
pub struct InMemoryHistoryStore {
    records: Mutex<HashMap<RoomId, Vec<HistoryRecord>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(&self, record: HistoryRecord) -> Result<(), RepositoryError> {
        let mut records = self.records.lock().await;
        records.entry(record.room.clone()).or_default().push(record);
        Ok(())
    }

    async fn list(&self, room: &RoomId) -> Result<Vec<HistoryRecord>, RepositoryError> {
        let records = self.records.lock().await;
        Ok(records.get(room).cloned().unwrap_or_default())
    }
}

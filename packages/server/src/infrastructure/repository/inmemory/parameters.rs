//! In-memory job parameter presets.

use std::{collections::HashMap, path::Path};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    domain::{JobParameters, ParameterStore, RepositoryError, RoomId},
    infrastructure::dto::websocket::JobParametersDto,
};

/// Parameter store backed by a `HashMap`.
#[derive(Default)]
pub struct InMemoryParameterStore {
    presets: RwLock<HashMap<RoomId, JobParameters>>,
}

impl InMemoryParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_presets(presets: impl IntoIterator<Item = (RoomId, JobParameters)>) -> Self {
        Self {
            presets: RwLock::new(presets.into_iter().collect()),
        }
    }
}

#[async_trait]
impl ParameterStore for InMemoryParameterStore {
    async fn get(&self, room: &RoomId) -> Result<Option<JobParameters>, RepositoryError> {
        Ok(self.presets.read().await.get(room).cloned())
    }

    async fn put(&self, room: RoomId, parameters: JobParameters) -> Result<(), RepositoryError> {
        self.presets.write().await.insert(room, parameters);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<(RoomId, JobParameters)>, RepositoryError> {
        let presets = self.presets.read().await;
        let mut entries: Vec<_> = presets
            .iter()
            .map(|(room, params)| (room.clone(), params.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }
}

/// Parse a presets document: a JSON object mapping room id to job parameters.
pub fn parse_presets(json: &str) -> Result<Vec<(RoomId, JobParameters)>, RepositoryError> {
    let raw: HashMap<String, JobParametersDto> =
        serde_json::from_str(json).map_err(|e| RepositoryError::Corrupt(e.to_string()))?;

    let mut presets = Vec::with_capacity(raw.len());
    for (room, dto) in raw {
        let room = RoomId::new(room).map_err(|e| RepositoryError::Corrupt(e.to_string()))?;
        presets.push((room, JobParameters::from(dto)));
    }
    presets.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(presets)
}

/// Load a presets file into a fresh store.
pub async fn load_presets(path: &Path) -> Result<InMemoryParameterStore, RepositoryError> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| RepositoryError::Unavailable(format!("{}: {}", path.display(), e)))?;
    let presets = parse_presets(&json)?;
    tracing::info!(
        "Loaded {} parameter presets from {}",
        presets.len(),
        path.display()
    );
    Ok(InMemoryParameterStore::with_presets(presets))
}

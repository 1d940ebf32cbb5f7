//! UseCase: ジョブパラメータ（プリセット）の管理
//!
//! ### 何をテストしているか
//! - ParameterUseCase::resolve() / put() / get()
//!
//! ### どのような状況を想定しているか
//! - 正常系：start のペイロードが保存済みプリセットより優先される
//! - 異常系：パラメータが無い、または不正な値
//! - 異常系：ストア障害

use std::sync::Arc;

use crate::domain::{JobConfig, JobParameters, ParameterStore, RoomId, ValidationError};

use super::error::ParameterError;

/// ジョブパラメータのユースケース
pub struct ParameterUseCase {
    store: Arc<dyn ParameterStore>,
}

impl ParameterUseCase {
    pub fn new(store: Arc<dyn ParameterStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, room: &RoomId) -> Result<Option<JobParameters>, ParameterError> {
        Ok(self.store.get(room).await?)
    }

    /// 検証に通ったパラメータだけを保存する
    pub async fn put(&self, room: RoomId, parameters: JobParameters) -> Result<(), ParameterError> {
        parameters.to_config()?;
        tracing::info!("Stored job parameters for room '{}'", room);
        self.store.put(room, parameters).await?;
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<(RoomId, JobParameters)>, ParameterError> {
        Ok(self.store.list().await?)
    }

    /// start に使うジョブ設定を決める
    ///
    /// # Arguments
    ///
    /// * `room` - 対象ルーム
    /// * `payload` - start メッセージに含まれていたパラメータ（あれば優先）
    pub async fn resolve(
        &self,
        room: &RoomId,
        payload: Option<JobParameters>,
    ) -> Result<JobConfig, ParameterError> {
        let parameters = match payload {
            Some(parameters) => parameters,
            None => self
                .store
                .get(room)
                .await?
                .ok_or_else(|| ValidationError::MissingParameters(room.to_string()))?,
        };
        Ok(parameters.to_config()?)
    }
}

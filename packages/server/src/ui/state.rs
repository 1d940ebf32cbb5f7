//! Shared application state.

use std::sync::Arc;

use crate::usecase::{HistoryUseCase, ParameterUseCase, SessionRegistry};

/// Shared application state
pub struct AppState {
    /// ルームと接続のレジストリ
    pub registry: Arc<SessionRegistry>,
    /// 実行履歴のユースケース
    pub history: Arc<HistoryUseCase>,
    /// ジョブパラメータのユースケース
    pub parameters: Arc<ParameterUseCase>,
}

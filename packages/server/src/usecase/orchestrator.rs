//! UseCase: ルーム単位のジョブ進行
//!
//! `RoomOrchestrator` owns one `RoomState` behind an async mutex. Every event
//! runs its transition and delivers the resulting effects while the lock is
//! held, so dispatch for a room never interleaves and an abort is observed
//! before any later assignment. Only the history round-trip leaves the lock.
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RoomOrchestrator の各イベント処理と効果（Effect）の配送
//!
//! ### どのような状況を想定しているか
//! - 正常系：start → assign → done → job-finished → history-update
//! - 異常系：実行中の start、停止中の done、メンバーでないノードの job-error
//! - エッジケース：ストア障害（終了は取り消されない）

use std::sync::Arc;

use colony_shared::time::{Clock, format_duration};
use tokio::sync::Mutex;

use crate::domain::{
    ClientId, Effect, FinishedTask, JobConfig, JobOutcome, MessagePusher, Notification, RoomId,
    RoomSnapshot, RoomState, TaskGenerator, Timestamp,
};

use super::{error::OrchestratorError, history::HistoryUseCase};

/// Collaborators shared by every room.
pub struct OrchestratorContext {
    pub pusher: Arc<dyn MessagePusher>,
    pub history: Arc<HistoryUseCase>,
    pub generator: Arc<dyn TaskGenerator>,
    pub clock: Arc<dyn Clock>,
    pub tasks_per_node: usize,
}

/// ルームのジョブ進行を担うユースケース
pub struct RoomOrchestrator {
    room: RoomId,
    state: Mutex<RoomState>,
    context: Arc<OrchestratorContext>,
}

impl RoomOrchestrator {
    pub fn new(room: RoomId, context: Arc<OrchestratorContext>) -> Self {
        let state = RoomState::with_tasks_per_node(room.clone(), context.tasks_per_node);
        Self {
            room,
            state: Mutex::new(state),
            context,
        }
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// ワーカーノードを参加させる（実行中なら追加タスクを即座に配布）
    pub async fn join(&self, node: ClientId) {
        let mut state = self.state.lock().await;
        tracing::info!("Room '{}': node '{}' joined", self.room, node);
        let effects = state.join(node, self.context.generator.as_ref());
        self.deliver(&state, effects).await;
    }

    pub async fn leave(&self, node: &ClientId) {
        let mut state = self.state.lock().await;
        tracing::info!("Room '{}': node '{}' left", self.room, node);
        let effects = state.leave(node);
        self.deliver(&state, effects).await;
    }

    /// 管理者を登録し、スナップショットを送る
    pub async fn add_admin(&self, admin: ClientId) {
        let mut state = self.state.lock().await;
        tracing::info!("Room '{}': admin '{}' joined", self.room, admin);
        let effects = state.add_admin(admin);
        self.deliver(&state, effects).await;
    }

    /// 切断されたクライアントをノードと管理者の両方から外す
    ///
    /// # Returns
    ///
    /// クライアントがこのルームのメンバーだったかどうか
    pub async fn disconnect(&self, client: &ClientId) -> bool {
        let mut state = self.state.lock().await;
        let was_admin = state.remove_admin(client);
        if state.node(client).is_some() {
            tracing::info!("Room '{}': node '{}' disconnected", self.room, client);
            let effects = state.leave(client);
            self.deliver(&state, effects).await;
            return true;
        }
        was_admin
    }

    pub async fn start(&self, config: JobConfig) -> Result<(), OrchestratorError> {
        let mut state = self.state.lock().await;
        let now = self.now();
        let effects = state.start(config, now, self.context.generator.as_ref())?;
        self.deliver(&state, effects).await;
        Ok(())
    }

    /// ノードから返された結果を集約する
    ///
    /// # Returns
    ///
    /// * `Ok(())` - 結果を受理した（終了判定・次タスクの配布を含む）
    /// * `Err(OrchestratorError)` - 検証エラー、または現在のジョブに属さない結果
    pub async fn task_completed(
        &self,
        node: &ClientId,
        finished: FinishedTask,
    ) -> Result<(), OrchestratorError> {
        let mut state = self.state.lock().await;
        let now = self.now();
        tracing::debug!(
            "Room '{}': '{}' returned generation {} ({} chromosomes)",
            self.room,
            node,
            finished.generation,
            finished.population.len()
        );
        let effects =
            state.task_completed(node, finished, now, self.context.generator.as_ref())?;
        self.deliver(&state, effects).await;
        Ok(())
    }

    pub async fn abort(&self) {
        let mut state = self.state.lock().await;
        let effects = state.abort();
        self.deliver(&state, effects).await;
    }

    pub async fn node_error(&self, node: &ClientId, error: String) -> Result<(), OrchestratorError> {
        let mut state = self.state.lock().await;
        tracing::warn!("Room '{}': node '{}' reported: {}", self.room, node, error);
        let effects = state.node_error(node, error)?;
        self.deliver(&state, effects).await;
        Ok(())
    }

    pub async fn snapshot(&self) -> RoomSnapshot {
        self.state.lock().await.snapshot()
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.context.clock.now_millis())
    }

    async fn deliver(&self, state: &RoomState, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Assign { node, task } => {
                    let notification = Notification::Assign(task);
                    if let Err(e) = self.context.pusher.push_to(&node, &notification).await {
                        tracing::warn!("Room '{}': assignment to '{}' lost: {}", self.room, node, e);
                    }
                }
                Effect::BroadcastSnapshot => {
                    let admins = state.admin_ids();
                    if admins.is_empty() {
                        continue;
                    }
                    let notification = Notification::RoomUpdate(state.snapshot());
                    self.broadcast(admins, &notification).await;
                }
                Effect::AbortNotice { recipients } => {
                    let notification = Notification::Aborted {
                        room: self.room.clone(),
                    };
                    self.broadcast(recipients, &notification).await;
                }
                Effect::Finished(outcome) => {
                    tracing::info!(
                        "Room '{}': job {} finished after {} ({} nodes), best '{}' with fitness {}",
                        self.room,
                        outcome.job.value(),
                        format_duration(outcome.duration_millis()),
                        outcome.node_count,
                        outcome.winning_chromosome.summary(),
                        outcome.fitness
                    );
                    let members = state.members();
                    let notification = Notification::JobFinished(outcome.clone());
                    self.broadcast(members.clone(), &notification).await;
                    self.persist(outcome, members);
                }
            }
        }
    }

    async fn broadcast(&self, targets: Vec<ClientId>, notification: &Notification) {
        if let Err(e) = self.context.pusher.broadcast(targets, notification).await {
            tracing::warn!("Room '{}': broadcast failed: {}", self.room, e);
        }
    }

    /// Append the outcome and send the room its refreshed history, off the room lock.
    fn persist(&self, outcome: JobOutcome, recipients: Vec<ClientId>) {
        let context = Arc::clone(&self.context);
        tokio::spawn(async move {
            let room = outcome.room.clone();
            match context.history.record(&outcome).await {
                Ok(records) => {
                    let notification = Notification::HistoryUpdate {
                        room: room.clone(),
                        records,
                    };
                    if let Err(e) = context.pusher.broadcast(recipients, &notification).await {
                        tracing::warn!("Room '{}': history broadcast failed: {}", room, e);
                    }
                }
                Err(e) => {
                    tracing::error!("Room '{}': failed to persist job result: {}", room, e);
                }
            }
        });
    }
}

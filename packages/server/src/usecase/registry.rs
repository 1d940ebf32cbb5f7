//! UseCase: ルームテーブルと接続の管理
//!
//! `SessionRegistry` maps room ids to independently locked orchestrators and
//! remembers which rooms every connection touched, so a disconnect can be
//! routed as a leave to each of them.
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SessionRegistry::connect() / disconnect() / handle()
//!
//! ### どのような状況を想定しているか
//! - 正常系：join/admin-join によるルームの遅延生成、start、request-room
//! - 異常系：重複 client_id、存在しないルームへのイベント、パラメータ無しの start
//! - エッジケース：存在しないルームの request-room は空のスナップショット

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use tokio::sync::{Mutex, RwLock};

use crate::domain::{
    ClientId, Notification, ProtocolError, PusherChannel, RoomEvent, RoomEventKind, RoomId,
    RoomSnapshot,
};

use super::{
    error::{ConnectError, OrchestratorError},
    orchestrator::{OrchestratorContext, RoomOrchestrator},
    parameters::ParameterUseCase,
};

/// ルームと接続を束ねるレジストリ
pub struct SessionRegistry {
    rooms: RwLock<HashMap<RoomId, Arc<RoomOrchestrator>>>,
    /// Rooms each connection joined or watched
    connections: Mutex<HashMap<ClientId, BTreeSet<RoomId>>>,
    context: Arc<OrchestratorContext>,
    parameters: Arc<ParameterUseCase>,
}

impl SessionRegistry {
    pub fn new(context: Arc<OrchestratorContext>, parameters: Arc<ParameterUseCase>) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            connections: Mutex::new(HashMap::new()),
            context,
            parameters,
        }
    }

    /// 接続を登録する
    ///
    /// # Returns
    ///
    /// * `Ok(())` - 接続成功
    /// * `Err(ConnectError)` - 同じ client_id が既に接続している
    pub async fn connect(&self, client: ClientId, sender: PusherChannel) -> Result<(), ConnectError> {
        {
            let mut connections = self.connections.lock().await;
            if connections.contains_key(&client) {
                return Err(ConnectError::DuplicateClientId(client.to_string()));
            }
            connections.insert(client.clone(), BTreeSet::new());
        }
        self.context.pusher.register_client(client, sender).await;
        Ok(())
    }

    /// 切断されたクライアントを参加していた全ルームから外す
    pub async fn disconnect(&self, client: &ClientId) {
        let rooms = self
            .connections
            .lock()
            .await
            .remove(client)
            .unwrap_or_default();
        for room in rooms {
            if let Some(orchestrator) = self.get(&room).await {
                orchestrator.disconnect(client).await;
            }
        }
        self.context.pusher.unregister_client(client).await;
    }

    pub async fn is_connected(&self, client: &ClientId) -> bool {
        self.connections.lock().await.contains_key(client)
    }

    /// 受信イベントを処理し、受理されなかった場合は送信元に理由を返す
    pub async fn handle(&self, client: &ClientId, event: RoomEvent) {
        let room = event.room.clone();
        let name = event.kind.name();
        if let Err(e) = self.route(client, event).await {
            match &e {
                OrchestratorError::Store(_) => {
                    tracing::error!("'{}' from '{}' in room '{}' failed: {}", name, client, room, e)
                }
                _ => {
                    tracing::warn!("'{}' from '{}' in room '{}' rejected: {}", name, client, room, e)
                }
            }
            self.reject(client, Some(room), e.to_string()).await;
        }
    }

    /// Apply one event to its room.
    pub async fn route(&self, client: &ClientId, event: RoomEvent) -> Result<(), OrchestratorError> {
        let RoomEvent { room, kind } = event;

        let orchestrator = match self.get(&room).await {
            Some(orchestrator) => orchestrator,
            None if kind.creates_room() => self.get_or_create(&room).await,
            None if matches!(kind, RoomEventKind::RequestRoom) => {
                let snapshot = RoomSnapshot::empty(room);
                self.reply(client, Notification::RoomUpdate(snapshot)).await;
                return Ok(());
            }
            None => return Err(ProtocolError::UnknownRoom(room.to_string()).into()),
        };

        match kind {
            RoomEventKind::Join => {
                self.track(client, &room).await;
                orchestrator.join(client.clone()).await;
            }
            RoomEventKind::AdminJoin => {
                self.track(client, &room).await;
                orchestrator.add_admin(client.clone()).await;
            }
            RoomEventKind::Leave => orchestrator.leave(client).await,
            RoomEventKind::Start { parameters } => {
                let config = self.parameters.resolve(&room, parameters).await?;
                orchestrator.start(config).await?;
            }
            RoomEventKind::Done(finished) => orchestrator.task_completed(client, finished).await?,
            RoomEventKind::JobError { error } => orchestrator.node_error(client, error).await?,
            RoomEventKind::Abort => orchestrator.abort().await,
            RoomEventKind::RequestRoom => {
                let snapshot = orchestrator.snapshot().await;
                self.reply(client, Notification::RoomUpdate(snapshot)).await;
            }
        }
        Ok(())
    }

    /// Tell `client` that its message was not accepted.
    pub async fn reject(&self, client: &ClientId, room: Option<RoomId>, reason: String) {
        self.reply(client, Notification::Rejected { room, reason })
            .await;
    }

    pub async fn get(&self, room: &RoomId) -> Option<Arc<RoomOrchestrator>> {
        self.rooms.read().await.get(room).cloned()
    }

    pub async fn get_or_create(&self, room: &RoomId) -> Arc<RoomOrchestrator> {
        let mut rooms = self.rooms.write().await;
        let orchestrator = rooms.entry(room.clone()).or_insert_with(|| {
            tracing::info!("Room '{}' created", room);
            Arc::new(RoomOrchestrator::new(
                room.clone(),
                Arc::clone(&self.context),
            ))
        });
        Arc::clone(orchestrator)
    }

    /// ルームのスナップショット（存在しないルームは空のスナップショット）
    pub async fn snapshot(&self, room: &RoomId) -> RoomSnapshot {
        match self.get(room).await {
            Some(orchestrator) => orchestrator.snapshot().await,
            None => RoomSnapshot::empty(room.clone()),
        }
    }

    /// 全ルームのスナップショットを room id 順で返す
    pub async fn snapshots(&self) -> Vec<RoomSnapshot> {
        let mut orchestrators: Vec<Arc<RoomOrchestrator>> =
            self.rooms.read().await.values().cloned().collect();
        orchestrators.sort_by(|a, b| a.room().cmp(b.room()));

        let mut snapshots = Vec::with_capacity(orchestrators.len());
        for orchestrator in orchestrators {
            snapshots.push(orchestrator.snapshot().await);
        }
        snapshots
    }

    async fn track(&self, client: &ClientId, room: &RoomId) {
        if let Some(rooms) = self.connections.lock().await.get_mut(client) {
            rooms.insert(room.clone());
        }
    }

    async fn reply(&self, client: &ClientId, notification: Notification) {
        if let Err(e) = self.context.pusher.push_to(client, &notification).await {
            tracing::warn!("Failed to reply to '{}': {}", client, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{FinishedTask, JobId, ValidationError, entity::fixtures},
        infrastructure::{
            repository::{InMemoryHistoryStore, InMemoryParameterStore},
            task_generator::RandomTaskGenerator,
        },
        usecase::{history::HistoryUseCase, testing::RecordingPusher},
    };
    use colony_shared::time::FixedClock;
    use tokio::sync::mpsc;

    fn create_registry(
        presets: Vec<(RoomId, crate::domain::JobParameters)>,
    ) -> (SessionRegistry, Arc<RecordingPusher>) {
        let pusher = Arc::new(RecordingPusher::default());
        let context = Arc::new(OrchestratorContext {
            pusher: pusher.clone(),
            history: Arc::new(HistoryUseCase::new(Arc::new(InMemoryHistoryStore::new()))),
            generator: Arc::new(RandomTaskGenerator::with_seed(11)),
            clock: Arc::new(FixedClock::new(0)),
            tasks_per_node: 4,
        });
        let parameters = Arc::new(ParameterUseCase::new(Arc::new(
            InMemoryParameterStore::with_presets(presets),
        )));
        (SessionRegistry::new(context, parameters), pusher)
    }

    fn event(room: &str, kind: RoomEventKind) -> RoomEvent {
        RoomEvent {
            room: fixtures::room(room),
            kind,
        }
    }

    async fn connect(registry: &SessionRegistry, name: &str) -> ClientId {
        let client = fixtures::client(name);
        let (tx, _rx) = mpsc::unbounded_channel();
        registry.connect(client.clone(), tx).await.unwrap();
        client
    }

    #[tokio::test]
    async fn test_connect_rejects_duplicate_client_id() {
        // テスト項目: 接続中の client_id で再接続すると DuplicateClientId になる
        // given (前提条件):
        let (registry, _pusher) = create_registry(vec![]);
        connect(&registry, "alice").await;

        // when (操作):
        let (tx, _rx) = mpsc::unbounded_channel();
        let result = registry.connect(fixtures::client("alice"), tx).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ConnectError::DuplicateClientId("alice".to_string()))
        );
    }

    #[tokio::test]
    async fn test_join_creates_room_lazily() {
        // テスト項目: join でルームが作られ、ノードとして登録される
        // given (前提条件):
        let (registry, _pusher) = create_registry(vec![]);
        let alice = connect(&registry, "alice").await;

        // when (操作):
        registry.handle(&alice, event("ga", RoomEventKind::Join)).await;

        // then (期待する結果):
        let snapshot = registry.snapshot(&fixtures::room("ga")).await;
        assert_eq!(snapshot.nodes.len(), 1);
        assert_eq!(snapshot.nodes[0].id, alice);
    }

    #[tokio::test]
    async fn test_event_for_unknown_room_is_rejected() {
        // テスト項目: 存在しないルームへの start は UnknownRoom になり、送信元に通知される
        // given (前提条件):
        let (registry, pusher) = create_registry(vec![]);
        let alice = connect(&registry, "alice").await;

        // when (操作):
        let result = registry
            .route(&alice, event("nowhere", RoomEventKind::Start { parameters: None }))
            .await;
        registry
            .handle(&alice, event("nowhere", RoomEventKind::Abort))
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(OrchestratorError::Protocol(ProtocolError::UnknownRoom(
                "nowhere".to_string()
            )))
        );
        assert!(matches!(
            pusher.sent_to(&alice).as_slice(),
            [Notification::Rejected { room: Some(room), .. }] if room.as_str() == "nowhere"
        ));
        assert!(registry.get(&fixtures::room("nowhere")).await.is_none());
    }

    #[tokio::test]
    async fn test_request_room_for_unknown_room_returns_empty_snapshot() {
        // テスト項目: 存在しないルームの request-room は空のスナップショットを返し、ルームは作られない
        // given (前提条件):
        let (registry, pusher) = create_registry(vec![]);
        let alice = connect(&registry, "alice").await;

        // when (操作):
        registry
            .handle(&alice, event("ghost", RoomEventKind::RequestRoom))
            .await;

        // then (期待する結果):
        assert_eq!(
            pusher.snapshots_to(&alice),
            vec![RoomSnapshot::empty(fixtures::room("ghost"))]
        );
        assert!(registry.get(&fixtures::room("ghost")).await.is_none());
    }

    #[tokio::test]
    async fn test_start_uses_stored_preset() {
        // テスト項目: ペイロード無しの start は保存済みプリセットで開始される
        // given (前提条件):
        let (registry, pusher) = create_registry(vec![(fixtures::room("ga"), fixtures::parameters())]);
        let alice = connect(&registry, "alice").await;
        let admin = connect(&registry, "dashboard").await;
        registry.handle(&alice, event("ga", RoomEventKind::Join)).await;
        registry
            .handle(&admin, event("ga", RoomEventKind::AdminJoin))
            .await;

        // when (操作):
        registry
            .handle(&admin, event("ga", RoomEventKind::Start { parameters: None }))
            .await;

        // then (期待する結果):
        assert_eq!(pusher.assignments_to(&alice).len(), 1);
        let snapshot = registry.snapshot(&fixtures::room("ga")).await;
        assert!(snapshot.job_running);
        assert_eq!(snapshot.max_generation, Some(3));
    }

    #[tokio::test]
    async fn test_start_without_parameters_is_rejected() {
        // テスト項目: プリセットもペイロードも無い start は ValidationError になる
        // given (前提条件):
        let (registry, _pusher) = create_registry(vec![]);
        let admin = connect(&registry, "dashboard").await;
        registry
            .handle(&admin, event("ga", RoomEventKind::AdminJoin))
            .await;

        // when (操作):
        let result = registry
            .route(&admin, event("ga", RoomEventKind::Start { parameters: None }))
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(OrchestratorError::Validation(
                ValidationError::MissingParameters("ga".to_string())
            ))
        );
        assert!(!registry.snapshot(&fixtures::room("ga")).await.job_running);
    }

    #[tokio::test]
    async fn test_done_is_routed_to_the_sender_room() {
        // テスト項目: done は送信元ノードの結果としてルームに集約される
        // given (前提条件):
        let (registry, _pusher) = create_registry(vec![]);
        let alice = connect(&registry, "alice").await;
        registry.handle(&alice, event("ga", RoomEventKind::Join)).await;
        registry
            .handle(
                &alice,
                event(
                    "ga",
                    RoomEventKind::Start {
                        parameters: Some(fixtures::parameters()),
                    },
                ),
            )
            .await;
        let finished = FinishedTask {
            job: Some(JobId::new(1)),
            ..fixtures::finished("ga", 1, &[1.0, 2.0])
        };

        // when (操作):
        registry
            .handle(&alice, event("ga", RoomEventKind::Done(finished)))
            .await;

        // then (期待する結果):
        let snapshot = registry.snapshot(&fixtures::room("ga")).await;
        assert_eq!(snapshot.total_fitness_sum, 3.0);
        assert_eq!(snapshot.chromosomes_returned, 2);
    }

    #[tokio::test]
    async fn test_disconnect_leaves_every_room() {
        // テスト項目: 切断すると参加していた全ルームから外れ、同じ ID で再接続できる
        // given (前提条件):
        let (registry, _pusher) = create_registry(vec![]);
        let alice = connect(&registry, "alice").await;
        registry.handle(&alice, event("ga", RoomEventKind::Join)).await;
        registry
            .handle(&alice, event("tsp", RoomEventKind::AdminJoin))
            .await;

        // when (操作):
        registry.disconnect(&alice).await;

        // then (期待する結果):
        assert!(registry.snapshot(&fixtures::room("ga")).await.nodes.is_empty());
        assert_eq!(registry.snapshot(&fixtures::room("tsp")).await.admin_count, 0);
        assert!(!registry.is_connected(&alice).await);
        let (tx, _rx) = mpsc::unbounded_channel();
        assert!(registry.connect(alice, tx).await.is_ok());
    }

    #[tokio::test]
    async fn test_snapshots_are_sorted_by_room() {
        // テスト項目: 全ルームのスナップショットは room id 順に並ぶ
        // given (前提条件):
        let (registry, _pusher) = create_registry(vec![]);
        let alice = connect(&registry, "alice").await;
        registry.handle(&alice, event("zeta", RoomEventKind::Join)).await;
        registry.handle(&alice, event("alpha", RoomEventKind::Join)).await;

        // when (操作):
        let snapshots = registry.snapshots().await;

        // then (期待する結果):
        let rooms: Vec<&str> = snapshots.iter().map(|s| s.room.as_str()).collect();
        assert_eq!(rooms, vec!["alpha", "zeta"]);
    }
}

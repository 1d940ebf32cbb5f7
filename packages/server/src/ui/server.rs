//! Server execution logic.

use std::{collections::HashMap, future::Future, sync::Arc};

use axum::{Router, routing::get};
use colony_shared::time::SystemClock;
use tokio::{net::TcpListener, sync::Mutex};
use tower_http::trace::TraceLayer;

use crate::{
    domain::{HistoryStore, ParameterStore},
    infrastructure::{message_pusher::WebSocketMessagePusher, task_generator::RandomTaskGenerator},
    usecase::{HistoryUseCase, OrchestratorContext, ParameterUseCase, SessionRegistry},
};

use super::{
    handler::{
        get_history, get_parameters, get_room_detail, get_rooms, health_check, put_parameters,
        websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Room orchestrator server
///
/// # Example
///
/// ```ignore
/// let server = Server::with_stores(history_store, parameter_store, 4);
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// SessionRegistry（ルームと接続のレジストリ）
    registry: Arc<SessionRegistry>,
    /// HistoryUseCase（実行履歴のユースケース）
    history: Arc<HistoryUseCase>,
    /// ParameterUseCase（ジョブパラメータのユースケース）
    parameters: Arc<ParameterUseCase>,
}

impl Server {
    pub fn new(
        registry: Arc<SessionRegistry>,
        history: Arc<HistoryUseCase>,
        parameters: Arc<ParameterUseCase>,
    ) -> Self {
        Self {
            registry,
            history,
            parameters,
        }
    }

    /// Wire the usecases around the given stores.
    ///
    /// Notifications go out through the WebSocket pusher, tasks are drawn from an
    /// entropy-seeded generator and time comes from the system clock.
    pub fn with_stores(
        history_store: Arc<dyn HistoryStore>,
        parameter_store: Arc<dyn ParameterStore>,
        tasks_per_node: usize,
    ) -> Self {
        let message_pusher_clients = Arc::new(Mutex::new(HashMap::new()));
        let message_pusher = Arc::new(WebSocketMessagePusher::new(message_pusher_clients));

        let history = Arc::new(HistoryUseCase::new(history_store));
        let parameters = Arc::new(ParameterUseCase::new(parameter_store));
        let context = Arc::new(OrchestratorContext {
            pusher: message_pusher,
            history: Arc::clone(&history),
            generator: Arc::new(RandomTaskGenerator::new()),
            clock: Arc::new(SystemClock),
            tasks_per_node,
        });
        let registry = Arc::new(SessionRegistry::new(context, Arc::clone(&parameters)));

        Self::new(registry, history, parameters)
    }

    /// Build the router with every endpoint
    pub fn router(&self) -> Router {
        let app_state = Arc::new(AppState {
            registry: Arc::clone(&self.registry),
            history: Arc::clone(&self.history),
            parameters: Arc::clone(&self.parameters),
        });

        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{room_id}", get(get_room_detail))
            .route("/api/history/{room_id}", get(get_history))
            .route(
                "/api/parameters/{room_id}",
                get(get_parameters).put(put_parameters),
            )
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Run the server until Ctrl+C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Colony server listening on {}", listener.local_addr()?);
        tracing::info!("Connect workers to: ws://{}/ws?client_id=<id>", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<()> {
        let app = self.router();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

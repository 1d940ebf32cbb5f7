//! Colony room orchestrator server.
//!
//! Workers and admin dashboards connect over WebSocket; rooms are created on
//! the first `join` or `admin-join`.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin colony-server
//! cargo run --bin colony-server -- --host 0.0.0.0 --port 3000 --presets presets.json
//! ```

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use colony_server::{
    domain::{HistoryStore, ParameterStore, room::DEFAULT_TASKS_PER_NODE},
    infrastructure::repository::{InMemoryHistoryStore, InMemoryParameterStore, load_presets},
    ui::Server,
};
use colony_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "colony-server")]
#[command(about = "Distributed genetic-algorithm room orchestrator", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// JSON file mapping room ids to job parameters
    #[arg(long)]
    presets: Option<PathBuf>,

    /// Tasks generated per joined node when a job starts
    #[arg(long, default_value_t = DEFAULT_TASKS_PER_NODE)]
    tasks_per_node: usize,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, default_value = "debug")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    if let Err(e) = run(args).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    // 1. Stores
    let parameter_store: Arc<dyn ParameterStore> = match &args.presets {
        Some(path) => Arc::new(load_presets(path).await?),
        None => Arc::new(InMemoryParameterStore::new()),
    };
    let history_store: Arc<dyn HistoryStore> = Arc::new(InMemoryHistoryStore::new());

    // 2. UseCases, MessagePusher and the server around them
    let server = Server::with_stores(history_store, parameter_store, args.tasks_per_node);

    // 3. Run until Ctrl+C / SIGTERM
    server.run(args.host, args.port).await
}

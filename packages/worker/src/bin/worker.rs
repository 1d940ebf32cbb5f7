//! Colony reference worker node with reconnection support.
//!
//! Joins a room and evolves every assigned population slice by one generation.
//! Automatically reconnects on disconnection (by default 5 attempts with 5 second interval).
//! Duplicate client_id connections are rejected by the server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin colony-worker -- --room GENETIC_ALG
//! cargo run --bin colony-worker -- -r GENETIC_ALG -c worker-1 --seed 42
//! ```

use std::time::Duration;

use clap::Parser;
use colony_shared::logger::setup_logger;
use colony_worker::{
    ReconnectPolicy, WorkerConfig, run_worker,
    runner::{DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_INTERVAL_SECS},
};

#[derive(Parser, Debug)]
#[command(name = "colony-worker")]
#[command(about = "Reference worker node for distributed genetic-algorithm rooms", long_about = None)]
struct Args {
    /// Room to join
    #[arg(short = 'r', long)]
    room: String,

    /// Client ID for this node (must be unique)
    #[arg(short = 'c', long)]
    client_id: Option<String>,

    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// Seed for reproducible evolution
    #[arg(long)]
    seed: Option<u64>,

    /// Consecutive failed connection attempts before giving up
    #[arg(long, default_value_t = DEFAULT_MAX_RECONNECT_ATTEMPTS)]
    max_reconnect_attempts: u32,

    /// Seconds between connection attempts
    #[arg(long, default_value_t = DEFAULT_RECONNECT_INTERVAL_SECS)]
    reconnect_interval: u64,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = WorkerConfig {
        url: args.url,
        room: args.room,
        client_id: args
            .client_id
            .unwrap_or_else(|| format!("worker-{}", uuid::Uuid::new_v4())),
        seed: args.seed,
        reconnect: ReconnectPolicy {
            max_attempts: args.max_reconnect_attempts,
            interval: Duration::from_secs(args.reconnect_interval),
        },
    };

    if let Err(e) = run_worker(config).await {
        tracing::error!("Worker error: {}", e);
        std::process::exit(1);
    }
}

//! Worker execution logic with reconnection support.

use std::time::Duration;

use rand::{SeedableRng, rngs::StdRng};

use crate::{
    error::WorkerError,
    session::{WorkerNode, run_worker_session},
};

pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;
pub const DEFAULT_RECONNECT_INTERVAL_SECS: u64 = 5;

/// When and how often a worker tries to get back into its room.
///
/// `max_attempts` bounds consecutive failed connection attempts. A session
/// that was established and later dropped starts a fresh budget, so a
/// long-running worker survives any number of server restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            interval: Duration::from_secs(DEFAULT_RECONNECT_INTERVAL_SECS),
        }
    }
}

impl ReconnectPolicy {
    /// Consecutive failures to carry into the next attempt, or `None` when the
    /// worker must stop.
    ///
    /// # Arguments
    ///
    /// * `error` - The error that ended the last session
    /// * `failures` - Consecutive failed attempts before that session
    pub fn next_failures(&self, error: &WorkerError, failures: u32) -> Option<u32> {
        match error {
            WorkerError::DuplicateClientId(_) => None,
            WorkerError::Disconnected(_) => Some(0),
            _ => {
                let failures = failures + 1;
                (failures < self.max_attempts).then_some(failures)
            }
        }
    }
}

/// Connection settings of a worker node
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    /// WebSocket endpoint, e.g. `ws://127.0.0.1:8080/ws`
    pub url: String,
    pub room: String,
    pub client_id: String,
    /// Fixed RNG seed; entropy when `None`
    pub seed: Option<u64>,
    pub reconnect: ReconnectPolicy,
}

/// Run the worker with reconnection logic until Ctrl+C.
///
/// # Errors
///
/// Returns the last session error when the client id is already in use or
/// when the reconnection budget is spent.
pub async fn run_worker(config: WorkerConfig) -> Result<(), WorkerError> {
    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut node = WorkerNode::new(config.room.clone(), rng);
    let policy = config.reconnect;
    let mut failures = 0;

    loop {
        tracing::info!(
            "Attempting to connect to {} as '{}' (attempt {}/{})",
            config.url,
            config.client_id,
            failures + 1,
            policy.max_attempts
        );

        let result = tokio::select! {
            result = run_worker_session(&config.url, &config.client_id, &mut node) => result,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down worker");
                return Ok(());
            }
        };

        let Err(e) = result else {
            tracing::info!("Worker session ended normally");
            return Ok(());
        };

        failures = match policy.next_failures(&e, failures) {
            Some(failures) => failures,
            None if matches!(e, WorkerError::DuplicateClientId(_)) => {
                tracing::error!(
                    "Cannot connect with client_id '{}' as it is already in use. Exiting.",
                    config.client_id
                );
                return Err(e);
            }
            None => {
                tracing::error!(
                    "Failed to reconnect after {} attempts. Exiting.",
                    policy.max_attempts
                );
                return Err(e);
            }
        };

        tracing::warn!("{}", e);
        tracing::info!(
            "Reconnecting in {} seconds... (attempt {}/{})",
            policy.interval.as_secs(),
            failures + 1,
            policy.max_attempts
        );

        tokio::time::sleep(policy.interval).await;
    }
}

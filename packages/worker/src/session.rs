//! WebSocket worker session management.

use colony_server::infrastructure::dto::websocket::{ClientMessage, ServerMessage};
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, protocol::Message},
};

use crate::{error::WorkerError, evolve::evolve};

/// Reaction of a worker node to the messages of one room.
pub struct WorkerNode<R> {
    room: String,
    rng: R,
}

impl<R: Rng> WorkerNode<R> {
    pub fn new(room: impl Into<String>, rng: R) -> Self {
        Self {
            room: room.into(),
            rng,
        }
    }

    pub fn join_message(&self) -> ClientMessage {
        ClientMessage::Join {
            room_id: self.room.clone(),
        }
    }

    /// Decide the reply to a server message, if any.
    ///
    /// Messages addressed to other rooms are ignored. An abort drops this node
    /// from the room, so the reply is a fresh join.
    pub fn respond(&mut self, message: ServerMessage) -> Option<ClientMessage> {
        let room_id = self.room.clone();
        match message {
            ServerMessage::Assign { room_id: to, task } if to == self.room => {
                tracing::debug!(
                    "Evolving {} chromosomes of generation {} (job {})",
                    task.population.len(),
                    task.generation,
                    task.job
                );
                match evolve(&task, &mut self.rng) {
                    Ok(task) => Some(ClientMessage::Done { room_id, task }),
                    Err(e) => {
                        tracing::warn!("Task failed: {}", e);
                        Some(ClientMessage::JobError {
                            room_id,
                            error: e.to_string(),
                        })
                    }
                }
            }
            ServerMessage::Abort { room_id: to } if to == self.room => {
                tracing::info!("Job in room '{}' aborted, rejoining", self.room);
                Some(ClientMessage::Join { room_id })
            }
            ServerMessage::JobFinished { room_id: to, result } if to == self.room => {
                tracing::info!(
                    "Job {} finished: '{}' (fitness {}, goal reached: {})",
                    result.job,
                    result.result,
                    result.fitness,
                    result.goal_reached
                );
                None
            }
            ServerMessage::Rejected { room_id, reason } => {
                tracing::warn!(
                    "Server rejected a message (room {:?}): {}",
                    room_id,
                    reason
                );
                None
            }
            _ => None,
        }
    }
}

fn connect_error(error: tungstenite::Error, client_id: &str) -> WorkerError {
    if let tungstenite::Error::Http(response) = &error
        && response.status().as_u16() == 409
    {
        return WorkerError::DuplicateClientId(client_id.to_string());
    }

    let error_msg = error.to_string();
    if error_msg.contains("409") || error_msg.contains("Conflict") {
        return WorkerError::DuplicateClientId(client_id.to_string());
    }
    WorkerError::ConnectionError(error_msg)
}

fn encode(message: &ClientMessage) -> Result<Message, WorkerError> {
    serde_json::to_string(message)
        .map(|json| Message::Text(json.into()))
        .map_err(|e| WorkerError::ConnectionError(format!("failed to encode message: {}", e)))
}

/// Run one WebSocket session: join the room and answer assignments until
/// the connection is lost.
pub async fn run_worker_session<R: Rng>(
    url: &str,
    client_id: &str,
    node: &mut WorkerNode<R>,
) -> Result<(), WorkerError> {
    // Construct URL with client_id as query parameter
    let url = format!("{}?client_id={}", url, client_id);

    let (ws_stream, response) = connect_async(&url)
        .await
        .map_err(|e| connect_error(e, client_id))?;

    // Check HTTP status code from response
    if response.status().as_u16() == 409 {
        return Err(WorkerError::DuplicateClientId(client_id.to_string()));
    }

    tracing::info!("Connected as '{}', joining room '{}'", client_id, node.room);

    let (mut write, mut read) = ws_stream.split();
    let lost = |e: tungstenite::Error| WorkerError::Disconnected(e.to_string());

    write.send(encode(&node.join_message())?).await.map_err(lost)?;

    while let Some(message) = read.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let message = match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(message) => message,
                    Err(e) => {
                        tracing::warn!("Ignoring unreadable server message: {}", e);
                        continue;
                    }
                };
                if let Some(reply) = node.respond(message) {
                    write.send(encode(&reply)?).await.map_err(lost)?;
                }
            }
            Ok(Message::Close(_)) => {
                tracing::info!("Server closed the connection");
                break;
            }
            Err(e) => {
                tracing::warn!("WebSocket read error: {}", e);
                return Err(lost(e));
            }
            _ => {}
        }
    }

    Err(WorkerError::Disconnected("Connection lost".to_string()))
}

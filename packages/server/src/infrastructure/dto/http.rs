//! HTTP API DTOs.

use serde::{Deserialize, Serialize};

/// One entry of `GET /api/rooms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub id: String,
    pub nodes: usize,
    pub admins: usize,
    pub job_running: bool,
    pub last_result: Option<String>,
}

/// Error body returned with 4xx/5xx responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDto {
    pub error: String,
}

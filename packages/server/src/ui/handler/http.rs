//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::RoomId,
    infrastructure::dto::{
        http::{ErrorDto, RoomSummaryDto},
        websocket::{HistoryRecordDto, JobParametersDto, RoomSnapshotDto},
    },
    ui::state::AppState,
    usecase::ParameterError,
};

type ApiError = (StatusCode, Json<ErrorDto>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorDto {
            error: message.into(),
        }),
    )
}

fn parse_room_id(room_id: String) -> Result<RoomId, ApiError> {
    RoomId::try_from(room_id).map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let snapshots = state.registry.snapshots().await;

    // Domain Model から DTO への変換
    Json(snapshots.iter().map(Into::into).collect())
}

/// Get room snapshot by ID (empty snapshot for rooms that were never created)
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomSnapshotDto>, ApiError> {
    let room = parse_room_id(room_id)?;
    let snapshot = state.registry.snapshot(&room).await;
    Ok(Json((&snapshot).into()))
}

/// Get run history of a room, newest first
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<Vec<HistoryRecordDto>>, ApiError> {
    let room = parse_room_id(room_id)?;
    match state.history.list(&room).await {
        Ok(records) => Ok(Json(records.iter().map(Into::into).collect())),
        Err(e) => {
            tracing::error!("Failed to read history of room '{}': {}", room, e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// Get the stored job parameters of a room
pub async fn get_parameters(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<JobParametersDto>, ApiError> {
    let room = parse_room_id(room_id)?;
    match state.parameters.get(&room).await {
        Ok(Some(parameters)) => Ok(Json((&parameters).into())),
        Ok(None) => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("no job parameters stored for room '{}'", room),
        )),
        Err(e) => Err(parameter_error(&room, e)),
    }
}

/// Validate and store job parameters for a room
pub async fn put_parameters(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Json(body): Json<JobParametersDto>,
) -> Result<StatusCode, ApiError> {
    let room = parse_room_id(room_id)?;
    match state.parameters.put(room.clone(), body.into()).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(parameter_error(&room, e)),
    }
}

fn parameter_error(room: &RoomId, error: ParameterError) -> ApiError {
    match error {
        ParameterError::Invalid(e) => {
            tracing::warn!("Rejected job parameters for room '{}': {}", room, e);
            api_error(StatusCode::BAD_REQUEST, e.to_string())
        }
        ParameterError::Store(e) => {
            tracing::error!("Parameter store failure for room '{}': {}", room, e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

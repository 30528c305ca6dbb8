//! Admission queue endpoints. All require a bearer token.
//!
//! - POST /api/queue/:name/join
//! - GET /api/queue/:name/status
//! - POST /api/queue/:name/leave

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use seatlease_web::{AppError, BearerToken};

use super::authenticate;
use crate::server::AppState;
use crate::types::{EventName, QueueStatus};

/// Join the queue, or get admitted straight away if a slot is free.
/// Joining again reports the current status.
pub async fn join(
    Path(name): Path<String>,
    State(state): State<AppState>,
    token: BearerToken,
) -> Result<Json<QueueStatus>, AppError> {
    let buyer = authenticate(&state, &token).await?;
    let coordinator = state.registry.get(&EventName::new(name)).await?;

    Ok(Json(coordinator.join_queue(&buyer).await?))
}

/// Admission state and queue position of the caller.
pub async fn status(
    Path(name): Path<String>,
    State(state): State<AppState>,
    token: BearerToken,
) -> Result<Json<QueueStatus>, AppError> {
    let buyer = authenticate(&state, &token).await?;
    let coordinator = state.registry.get(&EventName::new(name)).await?;

    Ok(Json(coordinator.queue_status(&buyer).await))
}

/// Leave the queue or give up the caller's active slot.
pub async fn leave(
    Path(name): Path<String>,
    State(state): State<AppState>,
    token: BearerToken,
) -> Result<StatusCode, AppError> {
    let buyer = authenticate(&state, &token).await?;
    let coordinator = state.registry.get(&EventName::new(name)).await?;

    coordinator.leave_queue(&buyer).await?;
    Ok(StatusCode::NO_CONTENT)
}

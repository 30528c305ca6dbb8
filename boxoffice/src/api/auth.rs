//! Session endpoints.
//!
//! - POST /api/auth/session - Open a session for a buyer id
//! - DELETE /api/auth/session - Close the caller's session

use axum::{Json, extract::State, http::StatusCode};
use seatlease_web::{AppError, BearerToken};
use serde::{Deserialize, Serialize};

use crate::server::AppState;
use crate::types::BuyerId;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to open a session.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    /// Buyer the session belongs to
    pub buyer_id: String,
}

/// A freshly issued session.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// Bearer token for the other endpoints
    pub token: String,
    /// Buyer the token resolves to
    pub buyer_id: BuyerId,
}

// ============================================================================
// Handlers
// ============================================================================

/// Open a session.
///
/// Any non-empty buyer id is accepted; there are no passwords.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/auth/session \
///   -H "Content-Type: application/json" \
///   -d '{"buyerId": "ada"}'
/// ```
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let buyer_id = request.buyer_id.trim();
    if buyer_id.is_empty() {
        return Err(AppError::bad_request("buyerId must not be empty"));
    }

    let buyer_id = BuyerId::new(buyer_id);
    let token = state.sessions.issue(buyer_id.clone());

    Ok((StatusCode::CREATED, Json(SessionResponse { token, buyer_id })))
}

/// Close the caller's session.
pub async fn end_session(State(state): State<AppState>, token: BearerToken) -> Result<StatusCode, AppError> {
    if state.sessions.revoke(token.as_str()) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::unauthorized("Unknown session"))
    }
}

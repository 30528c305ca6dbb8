//! HTTP and WebSocket endpoints.
//!
//! Handlers parse the request, resolve the caller and the event, and call
//! the event's coordinator. Domain errors convert into
//! [`AppError`](seatlease_web::AppError) with `?`.

pub mod auth;
pub mod events;
pub mod queue;
pub mod seats;
pub mod tickets;
pub mod websocket;

use seatlease_web::{AppError, BearerToken};

use crate::server::AppState;
use crate::types::BuyerId;

/// Resolve the caller of an authenticated endpoint.
///
/// # Errors
///
/// Returns 401 if the identity provider rejects the token.
pub async fn authenticate(state: &AppState, token: &BearerToken) -> Result<BuyerId, AppError> {
    state.identity.verify(token.as_str()).await.map_err(|error| {
        tracing::debug!(%error, "Rejected bearer token");
        AppError::unauthorized(error.to_string())
    })
}

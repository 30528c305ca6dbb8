//! GET /api/me/tickets - tickets the ledger holds for the caller.

use axum::{Json, extract::State};
use seatlease_web::{AppError, BearerToken};

use super::authenticate;
use crate::server::AppState;
use crate::types::Ticket;

/// The caller's tickets, across events.
///
/// Sales the ledger has not acknowledged yet are not listed.
pub async fn my_tickets(State(state): State<AppState>, token: BearerToken) -> Result<Json<Vec<Ticket>>, AppError> {
    let buyer = authenticate(&state, &token).await?;

    let tickets = state.ledger.tickets_for(&buyer).await.map_err(|error| {
        AppError::unavailable("Ticket ledger unavailable").with_source(anyhow::Error::new(error))
    })?;
    Ok(Json(tickets))
}

//! Seat trading endpoints. All require a bearer token.
//!
//! - POST /api/events/:name/hold - Lease seats
//! - POST /api/events/:name/unhold - Release the caller's leases
//! - POST /api/events/:name/purchase - Buy seats
//!
//! Bodies are either `{"seats": [{"row": 0, "col": 1}, ...]}` or the
//! single-seat shorthand `{"row": 0, "col": 1}`.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use seatlease_web::{AppError, BearerToken};
use serde::Deserialize;

use super::authenticate;
use crate::server::AppState;
use crate::types::{EventName, HoldReceipt, PurchaseReceipt, Seat};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Seats a trading request applies to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SeatsRequest {
    /// A group of seats, all or nothing
    Group {
        /// Requested seats, in order
        seats: Vec<Seat>,
    },
    /// One seat
    Single(Seat),
}

impl SeatsRequest {
    /// Requested seats, in request order
    #[must_use]
    pub fn into_seats(self) -> Vec<Seat> {
        match self {
            Self::Group { seats } => seats,
            Self::Single(seat) => vec![seat],
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Lease seats for the hold TTL.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/events/Starfall%20Live/hold \
///   -H "Authorization: Bearer <token>" \
///   -H "Content-Type: application/json" \
///   -d '{"seats": [{"row": 0, "col": 0}, {"row": 0, "col": 1}]}'
/// ```
pub async fn hold(
    Path(name): Path<String>,
    State(state): State<AppState>,
    token: BearerToken,
    Json(request): Json<SeatsRequest>,
) -> Result<Json<HoldReceipt>, AppError> {
    let buyer = authenticate(&state, &token).await?;
    let coordinator = state.registry.get(&EventName::new(name)).await?;

    Ok(Json(coordinator.hold(&buyer, request.into_seats()).await?))
}

/// Release seats the caller holds. Other seats are ignored.
pub async fn unhold(
    Path(name): Path<String>,
    State(state): State<AppState>,
    token: BearerToken,
    Json(request): Json<SeatsRequest>,
) -> Result<StatusCode, AppError> {
    let buyer = authenticate(&state, &token).await?;
    let coordinator = state.registry.get(&EventName::new(name)).await?;

    coordinator.unhold(&buyer, request.into_seats()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Buy seats that are available or held by the caller.
pub async fn purchase(
    Path(name): Path<String>,
    State(state): State<AppState>,
    token: BearerToken,
    Json(request): Json<SeatsRequest>,
) -> Result<Json<PurchaseReceipt>, AppError> {
    let buyer = authenticate(&state, &token).await?;
    let coordinator = state.registry.get(&EventName::new(name)).await?;

    Ok(Json(coordinator.purchase(&buyer, request.into_seats()).await?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn accepts_groups_and_single_seats() {
        let group: SeatsRequest =
            serde_json::from_str(r#"{"seats":[{"row":0,"col":1},{"row":2,"col":3}]}"#).unwrap();
        assert_eq!(group.into_seats(), vec![Seat::new(0, 1), Seat::new(2, 3)]);

        let single: SeatsRequest = serde_json::from_str(r#"{"row":4,"col":5}"#).unwrap();
        assert_eq!(single.into_seats(), vec![Seat::new(4, 5)]);
    }

    #[test]
    fn rejects_bodies_without_seats() {
        assert!(serde_json::from_str::<SeatsRequest>(r#"{"row":1}"#).is_err());
        assert!(serde_json::from_str::<SeatsRequest>(r#"{"seats":[{"row":-1,"col":0}]}"#).is_err());
    }
}

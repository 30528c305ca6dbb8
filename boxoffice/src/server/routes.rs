//! Router configuration for the box office.
//!
//! Builds the complete Axum router with all endpoints.

use super::state::AppState;
use crate::api::{auth, events, queue, seats, tickets, websocket};
use axum::{
    Router,
    routing::{get, post},
};
use seatlease_web::handlers::health_check;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// - `/health` liveness
/// - `/api/auth/session` session tokens
/// - `/api/events` listing, creation, detail, trading and the live feed
/// - `/api/queue/:name/*` admission
/// - `/api/me/tickets` the caller's tickets
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Sessions
        .route("/auth/session", post(auth::create_session).delete(auth::end_session))
        // Events
        .route("/events", get(events::list_events).post(events::create_event))
        .route("/events/:name", get(events::get_event))
        .route("/events/:name/live", get(websocket::live_feed))
        // Trading (bearer auth)
        .route("/events/:name/hold", post(seats::hold))
        .route("/events/:name/unhold", post(seats::unhold))
        .route("/events/:name/purchase", post(seats::purchase))
        // Admission (bearer auth)
        .route("/queue/:name/join", post(queue::join))
        .route("/queue/:name/status", get(queue::status))
        .route("/queue/:name/leave", post(queue::leave))
        // Buyer
        .route("/me/tickets", get(tickets::my_tickets));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

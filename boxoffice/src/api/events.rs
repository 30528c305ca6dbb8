//! Event management API endpoints.
//!
//! - POST /api/events - Open a new event
//! - GET /api/events - List open events
//! - GET /api/events/:name - Event detail with the seat grid

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use seatlease_web::AppError;
use serde::Deserialize;

use crate::server::AppState;
use crate::types::{EventDefinition, EventDetail, EventName, EventSummary};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to open an event.
///
/// Omitted sizes fall back to the configured defaults.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    /// Unique event name
    pub name: String,
    /// Grid rows
    pub rows: Option<u32>,
    /// Grid columns
    pub cols: Option<u32>,
    /// Require admission through the queue
    #[serde(default)]
    pub gated: bool,
    /// Active set capacity
    pub max_active: Option<usize>,
    /// Listing category
    pub category: Option<String>,
    /// Venue
    pub location: Option<String>,
    /// Start of the event
    pub starts_at: Option<DateTime<Utc>>,
    /// Listing metadata
    pub meta: Option<serde_json::Value>,
}

impl CreateEventRequest {
    fn into_definition(self, state: &AppState) -> EventDefinition {
        let defaults = &state.config.boxoffice;
        let mut definition = EventDefinition::new(
            self.name.trim(),
            self.rows.unwrap_or(defaults.default_rows),
            self.cols.unwrap_or(defaults.default_cols),
        )
        .gated(self.gated)
        .with_max_active(self.max_active.unwrap_or(defaults.max_active));

        if let Some(category) = self.category {
            definition = definition.with_category(category);
        }
        if let Some(location) = self.location {
            definition = definition.with_location(location);
        }
        if let Some(starts_at) = self.starts_at {
            definition = definition.starting_at(starts_at);
        }
        if let Some(meta) = self.meta {
            definition = definition.with_meta(meta);
        }
        definition
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Open an event.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/events \
///   -H "Content-Type: application/json" \
///   -d '{"name": "Starfall Live", "rows": 10, "cols": 20, "gated": true, "maxActive": 5}'
/// ```
pub async fn create_event(
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventSummary>), AppError> {
    let definition = request.into_definition(&state);
    let coordinator = state.registry.create(definition).await?;

    Ok((StatusCode::CREATED, Json(coordinator.summary().await)))
}

/// List open events, soonest first.
pub async fn list_events(State(state): State<AppState>) -> Json<Vec<EventSummary>> {
    Json(state.registry.list().await)
}

/// Event detail: listing fields, seat grid and queue counts.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/api/events/Starfall%20Live
/// ```
pub async fn get_event(
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<EventDetail>, AppError> {
    let coordinator = state.registry.get(&EventName::new(name)).await?;
    Ok(Json(coordinator.detail().await))
}

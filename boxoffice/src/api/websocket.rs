//! Live event feed.
//!
//! GET /api/events/:name/live upgrades to a WebSocket that first receives a
//! `snapshot` of the event, then every `seat:update` and `queue:update` in
//! the order the coordinator applied them. A client that falls behind gets a
//! fresh snapshot in place of the updates it missed.

use axum::{
    extract::{Path, State, WebSocketUpgrade},
    response::Response,
};
use seatlease_web::AppError;
use seatlease_web::handlers::stream_broadcast;
use serde::Serialize;
use std::sync::Arc;

use crate::coordinator::EventCoordinator;
use crate::fanout::Notification;
use crate::server::AppState;
use crate::types::{EventDetail, EventName};

/// A frame of the live feed.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum LiveMessage {
    /// Full state of the event
    Snapshot {
        /// Always `"snapshot"`
        #[serde(rename = "type")]
        kind: &'static str,
        /// Event detail
        event: Box<EventDetail>,
    },
    /// One change, serialized as the notification itself
    Update(Notification),
}

impl LiveMessage {
    /// Snapshot frame
    #[must_use]
    pub fn snapshot(detail: EventDetail) -> Self {
        Self::Snapshot {
            kind: "snapshot",
            event: Box::new(detail),
        }
    }
}

impl From<Notification> for LiveMessage {
    fn from(notification: Notification) -> Self {
        Self::Update(notification)
    }
}

/// Upgrade to the live feed of an event.
///
/// # Example
///
/// ```bash
/// websocat ws://localhost:8080/api/events/Starfall%20Live/live
/// ```
pub async fn live_feed(
    ws: WebSocketUpgrade,
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let event = EventName::new(name);
    let coordinator = state.registry.get(&event).await?;

    // Subscribe before snapshotting so no update falls in between.
    let rx = state.fanout.subscribe(&event);
    let initial = LiveMessage::snapshot(coordinator.detail().await);
    tracing::debug!(event = %event, "Live feed opened");

    Ok(ws.on_upgrade(move |socket| {
        stream_broadcast(socket, initial, rx, move || resync(Arc::clone(&coordinator)))
    }))
}

async fn resync(coordinator: Arc<EventCoordinator>) -> Option<LiveMessage> {
    Some(LiveMessage::snapshot(coordinator.detail().await))
}

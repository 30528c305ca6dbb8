//! Streaming a broadcast channel to a WebSocket client.
//!
//! ```text
//! Client          Live feed handler          Publisher
//!   │                    │                       │
//!   ├─ Connect ─────────>│                       │
//!   │                    ├─ subscribe() ────────>│
//!   │<─ initial snapshot ┤                       │
//!   │                    │<── broadcast ─────────┤
//!   │<─ update ──────────┤                       │
//!   │                    │   (lagged)            │
//!   │<─ fresh snapshot ──┤                       │
//! ```
//!
//! The client never has to send anything. Closing the socket (or sending a
//! close frame) ends both halves.

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt, stream::SplitSink};
use serde::Serialize;
use std::future::Future;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

/// Forward every item from `rx` to the socket as JSON.
///
/// `initial` is sent first. The receiver must have been subscribed *before*
/// `initial` was computed so that no update falls between the two. When the
/// receiver lags, `resync` produces a replacement message (typically a fresh
/// snapshot); returning `None` ends the stream.
pub async fn stream_broadcast<T, M, F, Fut>(
    socket: WebSocket,
    initial: M,
    mut rx: broadcast::Receiver<T>,
    resync: F,
) where
    T: Clone + Send + 'static,
    M: Serialize + From<T> + Send + Sync + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Option<M>> + Send,
{
    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        if send_json(&mut sender, &initial).await.is_err() {
            return;
        }

        loop {
            let message = match rx.recv().await {
                Ok(item) => M::from(item),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Live feed subscriber lagged, resynchronising");
                    match resync().await {
                        Some(message) => message,
                        None => break,
                    }
                },
                Err(RecvError::Closed) => break,
            };

            if send_json(&mut sender, &message).await.is_err() {
                break;
            }
        }

        debug!("Live feed send task terminated");
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if matches!(msg, Message::Close(_)) {
                debug!("Client requested close");
                break;
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    }

    debug!("Live feed closed");
}

/// Serialize a message as a text frame.
///
/// Returns `None` (after logging) if serialization fails.
#[must_use]
pub fn to_text<M: Serialize>(message: &M) -> Option<Message> {
    match serde_json::to_string(message) {
        Ok(json) => Some(Message::Text(json)),
        Err(error) => {
            warn!(%error, "Failed to serialize live feed message");
            None
        },
    }
}

async fn send_json<M: Serialize>(
    sender: &mut SplitSink<WebSocket, Message>,
    message: &M,
) -> Result<(), axum::Error> {
    match to_text(message) {
        Some(frame) => sender.send(frame).await,
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Update {
        row: u32,
        col: u32,
    }

    #[derive(Serialize)]
    struct Frame(String);

    impl From<String> for Frame {
        fn from(text: String) -> Self {
            Self(text)
        }
    }

    fn spawn_feed(socket: WebSocket, rx: broadcast::Receiver<String>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(stream_broadcast(socket, Frame::from("hello".to_string()), rx, || async {
            None
        }))
    }

    #[test]
    fn live_feeds_can_run_on_spawned_tasks() {
        let spawn: fn(WebSocket, broadcast::Receiver<String>) -> tokio::task::JoinHandle<()> = spawn_feed;
        let _ = spawn;
    }

    #[test]
    fn messages_become_text_frames() {
        let frame = to_text(&Update { row: 1, col: 2 });
        assert!(matches!(frame, Some(Message::Text(text)) if text == r#"{"row":1,"col":2}"#));
    }
}

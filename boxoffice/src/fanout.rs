//! Seat and queue notifications, and the publisher they go out through.
//!
//! Coordinators call [`FanoutPublisher::publish`] from inside their critical
//! section, so for one event the notifications arrive in exactly the order
//! the operations were serialized. Publishing must therefore never block.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tokio::sync::broadcast;

use crate::types::{EventName, Seat, SeatStatus};

/// A state change observers of an event care about.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notification {
    /// A seat changed state
    #[serde(rename = "seat:update", rename_all = "camelCase")]
    SeatUpdate {
        /// Row index
        row: u32,
        /// Column index
        col: u32,
        /// New state
        status: SeatStatus,
        /// Lease expiry, present for `held` only
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            with = "chrono::serde::ts_milliseconds_option"
        )]
        expires_at: Option<DateTime<Utc>>,
    },

    /// Admission counts changed
    #[serde(rename = "queue:update", rename_all = "camelCase")]
    QueueUpdate {
        /// Size of the active set
        active_count: usize,
        /// Length of the waiting queue
        queue_length: usize,
    },
}

impl Notification {
    /// `seat:update` for a seat
    #[must_use]
    pub const fn seat(seat: Seat, status: SeatStatus, expires_at: Option<DateTime<Utc>>) -> Self {
        Self::SeatUpdate {
            row: seat.row,
            col: seat.col,
            status,
            expires_at,
        }
    }

    /// `queue:update` from `(active count, queue length)`
    #[must_use]
    pub const fn queue((active_count, queue_length): (usize, usize)) -> Self {
        Self::QueueUpdate {
            active_count,
            queue_length,
        }
    }

    /// Wire name of the notification
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SeatUpdate { .. } => "seat:update",
            Self::QueueUpdate { .. } => "queue:update",
        }
    }
}

/// Narrow publish interface injected into every coordinator.
pub trait FanoutPublisher: Send + Sync {
    /// Deliver `notification` to observers of `event`. Must not block.
    fn publish(&self, event: &EventName, notification: Notification);
}

/// In-process fanout: one broadcast channel per event.
///
/// Channels are created on first subscription and swept once their last
/// receiver is gone. Publishing to an event nobody
/// has subscribed to is a no-op, and a slow subscriber only lags itself.
pub struct BroadcastFanout {
    capacity: usize,
    channels: RwLock<HashMap<EventName, broadcast::Sender<Notification>>>,
}

impl BroadcastFanout {
    /// Fanout whose per-event channels buffer `capacity` notifications
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribe to every notification for `event` published from now on
    pub fn subscribe(&self, event: &EventName) -> broadcast::Receiver<Notification> {
        if let Some(sender) = self
            .channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
        {
            return sender.subscribe();
        }

        let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
        channels.retain(|_, sender| sender.receiver_count() > 0);
        channels
            .entry(event.clone())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Events with an open channel
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Live subscribers of `event`
    #[must_use]
    pub fn receiver_count(&self, event: &EventName) -> usize {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

impl Default for BroadcastFanout {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl FanoutPublisher for BroadcastFanout {
    fn publish(&self, event: &EventName, notification: Notification) {
        let channels = self.channels.read().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = channels.get(event) else {
            return;
        };

        crate::metrics::record_notification(notification.kind());
        if sender.send(notification).is_err() {
            tracing::trace!(event = %event, "No live subscribers");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn seat_update_wire_format() {
        let held = Notification::seat(
            Seat::new(0, 1),
            SeatStatus::Held,
            DateTime::from_timestamp_millis(1_000),
        );
        assert_eq!(
            serde_json::to_value(&held).unwrap(),
            json!({ "type": "seat:update", "row": 0, "col": 1, "status": "held", "expiresAt": 1000 })
        );

        let sold = Notification::seat(Seat::new(2, 3), SeatStatus::Sold, None);
        assert_eq!(
            serde_json::to_value(&sold).unwrap(),
            json!({ "type": "seat:update", "row": 2, "col": 3, "status": "sold" })
        );
    }

    #[test]
    fn queue_update_wire_format() {
        let update = Notification::queue((3, 7));
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({ "type": "queue:update", "activeCount": 3, "queueLength": 7 })
        );
    }

    #[tokio::test]
    async fn subscribers_see_only_their_event() {
        let fanout = BroadcastFanout::new(8);
        let concert = EventName::new("concert");
        let movie = EventName::new("movie");
        let mut rx = fanout.subscribe(&concert);

        fanout.publish(&movie, Notification::queue((1, 0)));
        fanout.publish(&concert, Notification::queue((2, 0)));

        assert_eq!(rx.recv().await.unwrap(), Notification::queue((2, 0)));
        assert!(rx.try_recv().is_err());
        assert_eq!(fanout.receiver_count(&concert), 1);
        assert_eq!(fanout.receiver_count(&movie), 0);
    }

    #[test]
    fn abandoned_channels_are_swept() {
        let fanout = BroadcastFanout::new(8);
        let concert = EventName::new("concert");
        let movie = EventName::new("movie");

        let rx = fanout.subscribe(&concert);
        assert_eq!(fanout.channel_count(), 1);
        drop(rx);

        let _movie_rx = fanout.subscribe(&movie);
        assert_eq!(fanout.channel_count(), 1);
        assert_eq!(fanout.receiver_count(&concert), 0);
        assert_eq!(fanout.receiver_count(&movie), 1);
    }
}

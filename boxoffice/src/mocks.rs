//! In-memory doubles for the collaborator seams.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::fanout::{FanoutPublisher, Notification};
use crate::identity::{IdentityError, IdentityProvider};
use crate::ledger::{Ledger, LedgerError};
use crate::types::{BuyerId, EventName, PurchaseRecord, Seat, Ticket};

/// Fanout that keeps every notification, in publish order.
#[derive(Debug, Default)]
pub struct RecordingFanout {
    published: Mutex<Vec<(EventName, Notification)>>,
}

impl RecordingFanout {
    /// An empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far
    #[must_use]
    pub fn notifications(&self) -> Vec<(EventName, Notification)> {
        self.published.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Notifications for one event
    #[must_use]
    pub fn notifications_for(&self, event: &EventName) -> Vec<Notification> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(name, _)| name == event)
            .map(|(_, notification)| notification.clone())
            .collect()
    }

    /// `seat:update` notifications for one seat of one event
    #[must_use]
    pub fn seat_updates(&self, event: &EventName, seat: Seat) -> Vec<Notification> {
        self.notifications_for(event)
            .into_iter()
            .filter(|n| matches!(n, Notification::SeatUpdate { row, col, .. } if *row == seat.row && *col == seat.col))
            .collect()
    }

    /// Forget everything recorded
    pub fn clear(&self) {
        self.published.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl FanoutPublisher for RecordingFanout {
    fn publish(&self, event: &EventName, notification: Notification) {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((event.clone(), notification));
    }
}

/// Ledger that rejects every write and counts the attempts.
#[derive(Debug, Default)]
pub struct FailingLedger {
    attempts: AtomicUsize,
}

impl FailingLedger {
    /// A ledger that is always down
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes attempted so far
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Ledger for FailingLedger {
    fn record_purchase(
        &self,
        _record: PurchaseRecord,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Ticket>, LedgerError>> + Send + '_>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Err(LedgerError::Unavailable("ledger offline".to_string())) })
    }

    fn tickets_for<'a>(
        &'a self,
        _buyer: &'a BuyerId,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Ticket>, LedgerError>> + Send + 'a>> {
        Box::pin(async { Err(LedgerError::Unavailable("ledger offline".to_string())) })
    }
}

/// Identity provider with a fixed token table.
#[derive(Debug, Default)]
pub struct StaticIdentity {
    tokens: HashMap<String, BuyerId>,
}

impl StaticIdentity {
    /// No valid tokens
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token` as `buyer`
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, buyer: impl Into<BuyerId>) -> Self {
        self.tokens.insert(token.into(), buyer.into());
        self
    }
}

impl IdentityProvider for StaticIdentity {
    fn verify<'a>(
        &'a self,
        token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<BuyerId, IdentityError>> + Send + 'a>> {
        let buyer = self.tokens.get(token).cloned();
        Box::pin(async move { buyer.ok_or(IdentityError::InvalidToken) })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::SeatStatus;

    #[test]
    fn recording_fanout_filters_by_event_and_seat() {
        let fanout = RecordingFanout::new();
        let a = EventName::new("a");
        fanout.publish(&a, Notification::seat(Seat::new(0, 0), SeatStatus::Held, None));
        fanout.publish(&a, Notification::seat(Seat::new(0, 1), SeatStatus::Held, None));
        fanout.publish(&EventName::new("b"), Notification::queue((1, 0)));

        assert_eq!(fanout.notifications().len(), 3);
        assert_eq!(fanout.notifications_for(&a).len(), 2);
        assert_eq!(fanout.seat_updates(&a, Seat::new(0, 1)).len(), 1);

        fanout.clear();
        assert!(fanout.notifications().is_empty());
    }

    #[tokio::test]
    async fn failing_ledger_counts_attempts() {
        let ledger = FailingLedger::new();
        let record = PurchaseRecord {
            buyer: "u1".into(),
            event: "e".into(),
            seats: vec![Seat::new(0, 0)],
            purchased_at: chrono::Utc::now(),
        };

        assert!(ledger.record_purchase(record.clone()).await.is_err());
        assert!(ledger.record_purchase(record).await.is_err());
        assert_eq!(ledger.attempts(), 2);
    }

    #[tokio::test]
    async fn static_identity_knows_its_tokens() {
        let identity = StaticIdentity::new().with_token("t1", "ada");
        assert_eq!(identity.verify("t1").await.unwrap(), BuyerId::new("ada"));
        assert_eq!(identity.verify("t2").await, Err(IdentityError::InvalidToken));
    }
}

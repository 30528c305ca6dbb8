//! Lease bookkeeping for held seats.
//!
//! The timers themselves are cancellable delay effects run by the store; this
//! set records which lease is current for each held seat so that a timer
//! belonging to an older lease can be recognised and ignored.

use chrono::{DateTime, Utc};
use seatlease_core::EffectId;
use std::collections::HashMap;

use crate::types::{BuyerId, LeaseId, Seat};

/// The lease on one held seat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lease {
    /// Lease id, unique within the event
    pub id: LeaseId,
    /// Buyer holding the seat
    pub holder: BuyerId,
    /// When the lease lapses
    pub expires_at: DateTime<Utc>,
}

/// Current lease per held seat.
#[derive(Clone, Debug, Default)]
pub struct LeaseTimerSet {
    leases: HashMap<Seat, Lease>,
    next_id: u64,
}

impl LeaseTimerSet {
    /// An empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new lease for `seat`, replacing any previous one.
    pub fn grant(&mut self, seat: Seat, holder: BuyerId, expires_at: DateTime<Utc>) -> LeaseId {
        self.next_id += 1;
        let id = LeaseId::new(self.next_id);
        self.leases.insert(
            seat,
            Lease {
                id,
                holder,
                expires_at,
            },
        );
        id
    }

    /// Current lease on `seat`
    #[must_use]
    pub fn get(&self, seat: Seat) -> Option<&Lease> {
        self.leases.get(&seat)
    }

    /// Buyer holding `seat`
    #[must_use]
    pub fn holder(&self, seat: Seat) -> Option<&BuyerId> {
        self.leases.get(&seat).map(|lease| &lease.holder)
    }

    /// Whether `lease` is still the current lease on `seat`
    #[must_use]
    pub fn is_current(&self, seat: Seat, lease: LeaseId) -> bool {
        self.leases.get(&seat).is_some_and(|current| current.id == lease)
    }

    /// Drop the lease on `seat`
    pub fn revoke(&mut self, seat: Seat) -> Option<Lease> {
        self.leases.remove(&seat)
    }

    /// Number of live leases
    #[must_use]
    pub fn len(&self) -> usize {
        self.leases.len()
    }

    /// Whether no seat is leased
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leases.is_empty()
    }

    /// Id of the cancellable timer effect for `seat`.
    ///
    /// Store ids are per store, and every event has its own store, so the
    /// coordinate alone is unique.
    #[must_use]
    pub fn timer_id(seat: Seat) -> EffectId {
        EffectId::new(format!("lease:{}:{}", seat.row, seat.col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn regrant_supersedes_previous_lease() {
        let mut leases = LeaseTimerSet::new();
        let seat = Seat::new(1, 2);
        let now = Utc::now();

        let first = leases.grant(seat, BuyerId::new("u1"), now);
        let second = leases.grant(seat, BuyerId::new("u2"), now + Duration::seconds(5));

        assert_ne!(first, second);
        assert!(!leases.is_current(seat, first));
        assert!(leases.is_current(seat, second));
        assert_eq!(leases.holder(seat), Some(&BuyerId::new("u2")));
        assert_eq!(leases.len(), 1);
    }

    #[test]
    fn revoked_lease_is_no_longer_current() {
        let mut leases = LeaseTimerSet::new();
        let seat = Seat::new(0, 0);
        let id = leases.grant(seat, BuyerId::new("u1"), Utc::now());

        assert!(leases.revoke(seat).is_some());
        assert!(!leases.is_current(seat, id));
        assert!(leases.is_empty());
    }

    #[test]
    fn timer_ids_are_derived_from_the_seat() {
        assert_eq!(LeaseTimerSet::timer_id(Seat::new(3, 7)).as_str(), "lease:3:7");
    }
}

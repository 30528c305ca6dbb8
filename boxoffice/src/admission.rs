//! Admission control for gated events.
//!
//! Buyers join a FIFO queue and are moved into a bounded active set as room
//! becomes available. Only active buyers may trade on a gated event.
//!
//! Invariants:
//! - `active.len() <= max_active`
//! - no buyer is both queued and active
//! - the queue holds no duplicates
//! - after every mutation the active set is full or the queue is empty

use std::collections::{HashSet, VecDeque};

use crate::types::{BuyerId, QueueStatus};

/// Queue and active set of one event.
#[derive(Clone, Debug)]
pub struct AdmissionController {
    gated: bool,
    max_active: usize,
    queue: VecDeque<BuyerId>,
    active: HashSet<BuyerId>,
}

/// `(active count, queue length)` before and after a mutation.
pub type CountChange = ((usize, usize), (usize, usize));

impl AdmissionController {
    /// Controller for an event. Non-gated events admit everyone.
    #[must_use]
    pub fn new(gated: bool, max_active: usize) -> Self {
        Self {
            gated,
            max_active,
            queue: VecDeque::new(),
            active: HashSet::new(),
        }
    }

    /// Whether the event is gated
    #[must_use]
    pub const fn is_gated(&self) -> bool {
        self.gated
    }

    /// Whether `buyer` may hold, unhold or purchase
    #[must_use]
    pub fn may_trade(&self, buyer: &BuyerId) -> bool {
        !self.gated || self.active.contains(buyer)
    }

    /// `(active count, queue length)`
    #[must_use]
    pub fn counts(&self) -> (usize, usize) {
        (self.active.len(), self.queue.len())
    }

    /// Join the queue, then admit from its head while there is room.
    ///
    /// Re-joining is idempotent: an active buyer stays active, a queued buyer
    /// keeps their position.
    pub fn join(&mut self, buyer: &BuyerId) -> (QueueStatus, CountChange) {
        let before = self.counts();
        if self.gated && !self.active.contains(buyer) {
            if !self.queue.contains(buyer) {
                self.queue.push_back(buyer.clone());
            }
            self.fill();
        }
        (self.status(buyer), (before, self.counts()))
    }

    /// Admission state of `buyer`; never mutates.
    #[must_use]
    pub fn status(&self, buyer: &BuyerId) -> QueueStatus {
        let (active_count, queue_length) = self.counts();
        if !self.gated || self.active.contains(buyer) {
            return QueueStatus {
                admitted: true,
                position: 0,
                active_count,
                queue_length,
            };
        }

        let position = self
            .queue
            .iter()
            .position(|queued| queued == buyer)
            .map_or(0, |index| index + 1);

        QueueStatus {
            admitted: false,
            position,
            active_count,
            queue_length,
        }
    }

    /// Remove `buyer` from the queue and the active set, then refill.
    pub fn leave(&mut self, buyer: &BuyerId) -> CountChange {
        let before = self.counts();
        if self.gated {
            self.queue.retain(|queued| queued != buyer);
            self.active.remove(buyer);
            self.fill();
        }
        (before, self.counts())
    }

    /// A purchase by `buyer` completed: release their active slot.
    pub fn complete_purchase(&mut self, buyer: &BuyerId) -> CountChange {
        let before = self.counts();
        if self.gated && self.active.remove(buyer) {
            self.fill();
        }
        (before, self.counts())
    }

    fn fill(&mut self) {
        while self.active.len() < self.max_active {
            let Some(next) = self.queue.pop_front() else {
                break;
            };
            tracing::debug!(buyer = %next, "Admitted from queue");
            self.active.insert(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn buyer(n: usize) -> BuyerId {
        BuyerId::new(format!("u{n}"))
    }

    #[test]
    fn non_gated_events_admit_everyone() {
        let mut admission = AdmissionController::new(false, 1);
        let (status, change) = admission.join(&buyer(1));

        assert!(status.admitted);
        assert_eq!(status.position, 0);
        assert_eq!(change.0, change.1);
        assert!(admission.may_trade(&buyer(2)));
    }

    #[test]
    fn overflow_waits_in_fifo_order() {
        let mut admission = AdmissionController::new(true, 2);
        for n in 0..5 {
            admission.join(&buyer(n));
        }

        assert!(admission.may_trade(&buyer(0)));
        assert!(admission.may_trade(&buyer(1)));
        assert_eq!(admission.status(&buyer(2)).position, 1);
        assert_eq!(admission.status(&buyer(4)).position, 3);
        assert_eq!(admission.counts(), (2, 3));

        admission.complete_purchase(&buyer(0));
        assert!(admission.may_trade(&buyer(2)));
        assert_eq!(admission.status(&buyer(3)).position, 1);
    }

    #[test]
    fn rejoin_keeps_position() {
        let mut admission = AdmissionController::new(true, 1);
        admission.join(&buyer(0));
        admission.join(&buyer(1));
        admission.join(&buyer(2));

        let (status, change) = admission.join(&buyer(1));
        assert_eq!(status.position, 1);
        assert_eq!(change.0, change.1);
    }

    #[test]
    fn unknown_buyer_has_position_zero() {
        let admission = AdmissionController::new(true, 1);
        let status = admission.status(&buyer(9));
        assert!(!status.admitted);
        assert_eq!(status.position, 0);
    }

    #[test]
    fn leaving_frees_a_slot() {
        let mut admission = AdmissionController::new(true, 1);
        admission.join(&buyer(0));
        admission.join(&buyer(1));

        let (before, after) = admission.leave(&buyer(0));
        assert_eq!(before, (1, 1));
        assert_eq!(after, (1, 0));
        assert!(admission.may_trade(&buyer(1)));
    }

    #[test]
    fn purchase_by_inactive_buyer_changes_nothing() {
        let mut admission = AdmissionController::new(true, 1);
        admission.join(&buyer(0));
        let (before, after) = admission.complete_purchase(&buyer(5));
        assert_eq!(before, after);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Join(usize),
        Leave(usize),
        Purchase(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..12usize).prop_map(Op::Join),
            (0..12usize).prop_map(Op::Leave),
            (0..12usize).prop_map(Op::Purchase),
        ]
    }

    proptest! {
        #[test]
        fn invariants_hold_under_any_sequence(
            max_active in 1..5usize,
            ops in prop::collection::vec(op(), 0..60),
        ) {
            let mut admission = AdmissionController::new(true, max_active);
            for op in ops {
                match op {
                    Op::Join(n) => { admission.join(&buyer(n)); },
                    Op::Leave(n) => { admission.leave(&buyer(n)); },
                    Op::Purchase(n) => { admission.complete_purchase(&buyer(n)); },
                }

                let (active, queued) = admission.counts();
                prop_assert!(active <= max_active);
                prop_assert!(queued == 0 || active == max_active);
                let unique: HashSet<_> = admission.queue.iter().collect();
                prop_assert_eq!(unique.len(), queued);
                prop_assert!(admission.queue.iter().all(|b| !admission.active.contains(b)));
            }
        }
    }
}

//! Inputs to the event reducer.

use seatlease_core::Reply;

use crate::error::BoxOfficeError;
use crate::types::{BuyerId, HoldReceipt, LeaseId, PurchaseReceipt, PurchaseRecord, QueueStatus, Seat};

/// Every input to an event's coordinator.
///
/// Requests carry a [`Reply`] that the reducer answers from inside the
/// critical section. Timer fires and ledger outcomes come back as actions
/// too, so they serialize with requests.
#[derive(Clone, Debug)]
pub enum EventAction {
    // ========== Requests ==========
    /// Lease seats to a buyer
    Hold {
        /// Requesting buyer
        buyer: BuyerId,
        /// Seats to lease, all or nothing
        seats: Vec<Seat>,
        /// Receipt or the first failing seat
        reply: Reply<Result<HoldReceipt, BoxOfficeError>>,
    },

    /// Release seats the buyer holds
    Unhold {
        /// Requesting buyer
        buyer: BuyerId,
        /// Seats to release; others are skipped
        seats: Vec<Seat>,
        /// Completion
        reply: Reply<Result<(), BoxOfficeError>>,
    },

    /// Buy held or available seats
    Purchase {
        /// Requesting buyer
        buyer: BuyerId,
        /// Seats to buy, all or nothing
        seats: Vec<Seat>,
        /// Receipt or the first failing seat
        reply: Reply<Result<PurchaseReceipt, BoxOfficeError>>,
    },

    /// Enter the admission queue
    JoinQueue {
        /// Joining buyer
        buyer: BuyerId,
        /// Admission state after joining
        reply: Reply<QueueStatus>,
    },

    /// Leave the queue or give up an active slot
    LeaveQueue {
        /// Leaving buyer
        buyer: BuyerId,
        /// Completion
        reply: Reply<()>,
    },

    // ========== Effect feedback ==========
    /// A lease timer elapsed
    LeaseExpired {
        /// Leased seat
        seat: Seat,
        /// Lease the timer was scheduled for
        lease: LeaseId,
    },

    /// The ledger rejected a sale after every retry
    LedgerWriteFailed {
        /// The committed sale
        record: PurchaseRecord,
        /// Last ledger error
        error: String,
    },
}

impl EventAction {
    /// Short label for logs and metrics
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Hold { .. } => "hold",
            Self::Unhold { .. } => "unhold",
            Self::Purchase { .. } => "purchase",
            Self::JoinQueue { .. } => "join_queue",
            Self::LeaveQueue { .. } => "leave_queue",
            Self::LeaseExpired { .. } => "lease_expired",
            Self::LedgerWriteFailed { .. } => "ledger_write_failed",
        }
    }
}

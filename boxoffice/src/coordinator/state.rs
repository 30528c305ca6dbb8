//! State owned by one event's coordinator.

use crate::admission::AdmissionController;
use crate::grid::SeatGrid;
use crate::lease::LeaseTimerSet;
use crate::types::{EventDefinition, EventDetail, EventSummary, PurchaseRecord};

/// A sale the ledger could not record after every retry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnrecordedPurchase {
    /// The committed sale
    pub record: PurchaseRecord,
    /// Last ledger error
    pub error: String,
}

/// Everything one event's coordinator owns exclusively.
#[derive(Clone, Debug)]
pub struct EventState {
    /// Listing data and limits
    pub definition: EventDefinition,
    /// Seat states
    pub grid: SeatGrid,
    /// Current lease per held seat
    pub leases: LeaseTimerSet,
    /// Queue and active set
    pub admission: AdmissionController,
    /// Sales awaiting reconciliation with the ledger
    pub unrecorded: Vec<UnrecordedPurchase>,
}

impl EventState {
    /// Fresh state: every seat available, nobody queued.
    #[must_use]
    pub fn new(definition: EventDefinition) -> Self {
        Self {
            grid: SeatGrid::new(definition.rows, definition.cols),
            leases: LeaseTimerSet::new(),
            admission: AdmissionController::new(definition.gated, definition.max_active),
            unrecorded: Vec::new(),
            definition,
        }
    }

    /// Listing entry with current seat counts
    #[must_use]
    pub fn summary(&self) -> EventSummary {
        let counts = self.grid.counts();
        let def = &self.definition;
        EventSummary {
            name: def.name.clone(),
            category: def.category.clone(),
            location: def.location.clone(),
            starts_at: def.starts_at,
            rows: def.rows,
            cols: def.cols,
            gated: def.gated,
            max_active: def.max_active,
            available: counts.available,
            held: counts.held,
            sold: counts.sold,
            meta: def.meta.clone(),
        }
    }

    /// Summary plus the seat grid and admission counts
    #[must_use]
    pub fn detail(&self) -> EventDetail {
        let (active_count, queue_length) = self.admission.counts();
        EventDetail {
            summary: self.summary(),
            seats: self.grid.snapshot(),
            active_count,
            queue_length,
        }
    }
}

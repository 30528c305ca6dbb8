//! Typed handle over one event's store.

use seatlease_runtime::{Store, StoreConfig, StoreError};

use super::actions::EventAction;
use super::environment::EventEnvironment;
use super::reducer::EventReducer;
use super::state::{EventState, UnrecordedPurchase};
use crate::error::BoxOfficeError;
use crate::types::{
    BuyerId, EventDefinition, EventDetail, EventName, EventSummary, HoldReceipt, PurchaseReceipt,
    QueueStatus, Seat,
};

/// The store type behind every coordinator.
pub type EventStore = Store<EventState, EventAction, EventEnvironment, EventReducer>;

/// Single serialization point for one event.
///
/// Every mutating operation is an action sent through the event's store and
/// reduced under its write lock; reads observe the state between two
/// reductions. Coordinators of different events share nothing.
#[derive(Clone)]
pub struct EventCoordinator {
    name: EventName,
    store: EventStore,
}

impl EventCoordinator {
    /// Open an event for sale.
    ///
    /// # Errors
    ///
    /// Returns [`BoxOfficeError::InvalidDefinition`] if the definition fails
    /// validation.
    pub fn new(
        definition: EventDefinition,
        env: EventEnvironment,
        config: StoreConfig,
    ) -> Result<Self, BoxOfficeError> {
        definition.validate()?;
        let name = definition.name.clone();
        tracing::info!(
            event = %name,
            rows = definition.rows,
            cols = definition.cols,
            gated = definition.gated,
            max_active = definition.max_active,
            "Event opened"
        );

        Ok(Self {
            name,
            store: Store::with_config(EventState::new(definition), EventReducer::new(), env, config),
        })
    }

    /// Event name
    #[must_use]
    pub const fn name(&self) -> &EventName {
        &self.name
    }

    /// Lease `seats` to `buyer` until the lease TTL elapses.
    ///
    /// # Errors
    ///
    /// `NotAdmitted`, `NoSeatsRequested`, `InvalidSeat`, `SeatUnavailable`,
    /// or `Unavailable` once the coordinator is shutting down.
    pub async fn hold(&self, buyer: &BuyerId, seats: Vec<Seat>) -> Result<HoldReceipt, BoxOfficeError> {
        self.store
            .ask(|reply| EventAction::Hold {
                buyer: buyer.clone(),
                seats,
                reply,
            })
            .await?
    }

    /// Release seats `buyer` holds. Seats that are not held by `buyer` are
    /// skipped.
    ///
    /// # Errors
    ///
    /// `NotAdmitted` on a gated event, or `Unavailable`.
    pub async fn unhold(&self, buyer: &BuyerId, seats: Vec<Seat>) -> Result<(), BoxOfficeError> {
        self.store
            .ask(|reply| EventAction::Unhold {
                buyer: buyer.clone(),
                seats,
                reply,
            })
            .await?
    }

    /// Buy `seats`, each either available or held by `buyer`.
    ///
    /// # Errors
    ///
    /// Same as [`hold`](Self::hold).
    pub async fn purchase(
        &self,
        buyer: &BuyerId,
        seats: Vec<Seat>,
    ) -> Result<PurchaseReceipt, BoxOfficeError> {
        self.store
            .ask(|reply| EventAction::Purchase {
                buyer: buyer.clone(),
                seats,
                reply,
            })
            .await?
    }

    /// Join the admission queue.
    ///
    /// # Errors
    ///
    /// `Unavailable` once the coordinator is shutting down.
    pub async fn join_queue(&self, buyer: &BuyerId) -> Result<QueueStatus, BoxOfficeError> {
        Ok(self
            .store
            .ask(|reply| EventAction::JoinQueue {
                buyer: buyer.clone(),
                reply,
            })
            .await?)
    }

    /// Admission state of `buyer`
    pub async fn queue_status(&self, buyer: &BuyerId) -> QueueStatus {
        self.store.state(|state| state.admission.status(buyer)).await
    }

    /// Leave the queue or give up an active slot.
    ///
    /// # Errors
    ///
    /// `Unavailable` once the coordinator is shutting down.
    pub async fn leave_queue(&self, buyer: &BuyerId) -> Result<(), BoxOfficeError> {
        Ok(self
            .store
            .ask(|reply| EventAction::LeaveQueue {
                buyer: buyer.clone(),
                reply,
            })
            .await?)
    }

    /// Listing entry with seat counts
    pub async fn summary(&self) -> EventSummary {
        self.store.state(EventState::summary).await
    }

    /// Summary, seat grid and admission counts from one consistent read
    pub async fn detail(&self) -> EventDetail {
        self.store.state(EventState::detail).await
    }

    /// Sales the ledger never acknowledged
    pub async fn unrecorded_purchases(&self) -> Vec<UnrecordedPurchase> {
        self.store.state(|state| state.unrecorded.clone()).await
    }

    /// Lease timers currently scheduled
    #[must_use]
    pub fn live_timers(&self) -> usize {
        self.store.live_cancellables()
    }

    /// Stop accepting work, drop pending lease timers and wait for in-flight
    /// ledger writes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if ledger writes are still
    /// running when the configured timeout elapses.
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        tracing::info!(event = %self.name, "Closing event");
        self.store.shutdown_default().await
    }
}

//! The event reducer: every seat, lease and queue transition of one event.
//!
//! Check order for trading requests is admission, then bounds, then
//! availability. Multi-seat requests are validated in full before the first
//! seat changes, so a failed request leaves no trace.

use seatlease_core::{Effect, Reducer, SmallVec, async_effect, delay, reply, smallvec};
use seatlease_runtime::retry::retry_with_backoff;
use std::collections::HashSet;
use std::sync::Arc;

use super::actions::EventAction;
use super::environment::EventEnvironment;
use super::state::{EventState, UnrecordedPurchase};
use crate::error::BoxOfficeError;
use crate::fanout::Notification;
use crate::lease::LeaseTimerSet;
use crate::metrics;
use crate::types::{
    BuyerId, EventName, HoldReceipt, LeaseId, LeasedSeat, PurchaseReceipt, PurchaseRecord, Seat,
    SeatStatus,
};

type Effects = SmallVec<[Effect<EventAction>; 4]>;

/// Reducer for one event.
#[derive(Clone, Copy, Debug, Default)]
pub struct EventReducer;

impl EventReducer {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn hold(
        state: &mut EventState,
        env: &EventEnvironment,
        buyer: &BuyerId,
        seats: Vec<Seat>,
    ) -> Result<(HoldReceipt, Effects), BoxOfficeError> {
        let seats = Self::prepare(state, buyer, seats, false)?;

        let expires_at = env.lease_expiry(env.clock.now());
        let mut effects = Effects::new();
        let mut notifications = Vec::with_capacity(seats.len());
        let mut leased = Vec::with_capacity(seats.len());

        for seat in seats {
            state.grid.transition(seat, SeatStatus::Held)?;
            let lease = state.leases.grant(seat, buyer.clone(), expires_at);

            let timer = delay! {
                duration: env.hold_ttl,
                action: EventAction::LeaseExpired { seat, lease }
            };
            effects.push(timer.cancellable(LeaseTimerSet::timer_id(seat)));
            notifications.push(Notification::seat(seat, SeatStatus::Held, Some(expires_at)));
            leased.push(LeasedSeat {
                row: seat.row,
                col: seat.col,
                expires_at,
            });
        }

        metrics::record_hold(leased.len());
        effects.push(Self::publish(env, &state.definition.name, notifications));

        Ok((
            HoldReceipt {
                expires_at,
                expires_in_ms: env.hold_ttl_ms(),
                seats: leased,
            },
            effects,
        ))
    }

    fn unhold(
        state: &mut EventState,
        env: &EventEnvironment,
        buyer: &BuyerId,
        seats: Vec<Seat>,
    ) -> Result<Effects, BoxOfficeError> {
        if !state.admission.may_trade(buyer) {
            return Err(BoxOfficeError::NotAdmitted(buyer.clone()));
        }

        let mut effects = Effects::new();
        let mut notifications = Vec::new();

        for seat in dedupe(seats) {
            if state.grid.status(seat) != Some(SeatStatus::Held)
                || state.leases.holder(seat) != Some(buyer)
            {
                continue;
            }

            state.grid.transition(seat, SeatStatus::Available)?;
            state.leases.revoke(seat);
            effects.push(Effect::Cancel(LeaseTimerSet::timer_id(seat)));
            notifications.push(Notification::seat(seat, SeatStatus::Available, None));
        }

        metrics::record_unhold(notifications.len());
        effects.push(Self::publish(env, &state.definition.name, notifications));
        Ok(effects)
    }

    fn purchase(
        state: &mut EventState,
        env: &EventEnvironment,
        buyer: &BuyerId,
        seats: Vec<Seat>,
    ) -> Result<(PurchaseReceipt, Effects), BoxOfficeError> {
        let seats = Self::prepare(state, buyer, seats, true)?;

        let mut effects = Effects::new();
        let mut notifications = Vec::with_capacity(seats.len() + 1);

        for &seat in &seats {
            if state.leases.revoke(seat).is_some() {
                effects.push(Effect::Cancel(LeaseTimerSet::timer_id(seat)));
            }
            state.grid.transition(seat, SeatStatus::Sold)?;
            notifications.push(Notification::seat(seat, SeatStatus::Sold, None));
        }

        let (before, after) = state.admission.complete_purchase(buyer);
        if before != after {
            notifications.push(Notification::queue(after));
        }

        metrics::record_purchase(seats.len());
        effects.push(Self::publish(env, &state.definition.name, notifications));

        let record = PurchaseRecord {
            buyer: buyer.clone(),
            event: state.definition.name.clone(),
            seats: seats.clone(),
            purchased_at: env.clock.now(),
        };
        effects.push(Self::record_purchase(env, record));

        Ok((
            PurchaseReceipt {
                ticket_count: seats.len(),
                seats,
            },
            effects,
        ))
    }

    /// Shared validation for hold and purchase; returns the de-duplicated seats.
    ///
    /// `purchase` also accepts seats currently leased to `buyer`.
    fn prepare(
        state: &EventState,
        buyer: &BuyerId,
        seats: Vec<Seat>,
        purchase: bool,
    ) -> Result<Vec<Seat>, BoxOfficeError> {
        if !state.admission.may_trade(buyer) {
            return Err(BoxOfficeError::NotAdmitted(buyer.clone()));
        }

        let seats = dedupe(seats);
        if seats.is_empty() {
            return Err(BoxOfficeError::NoSeatsRequested);
        }

        if let Some(&seat) = seats.iter().find(|&&seat| !state.grid.contains(seat)) {
            return Err(BoxOfficeError::InvalidSeat(seat));
        }

        let unavailable = seats.iter().find(|&&seat| match state.grid.status(seat) {
            Some(SeatStatus::Available) => false,
            Some(SeatStatus::Held) => !purchase || state.leases.holder(seat) != Some(buyer),
            Some(SeatStatus::Sold) | None => true,
        });
        if let Some(&seat) = unavailable {
            return Err(BoxOfficeError::SeatUnavailable(seat));
        }

        Ok(seats)
    }

    fn expire(state: &mut EventState, env: &EventEnvironment, seat: Seat, lease: LeaseId) -> Effects {
        if !state.leases.is_current(seat, lease) {
            tracing::trace!(event = %state.definition.name, %seat, %lease, "Stale lease timer ignored");
            return smallvec![Effect::None];
        }

        state.leases.revoke(seat);
        if let Err(error) = state.grid.transition(seat, SeatStatus::Available) {
            tracing::warn!(event = %state.definition.name, %seat, %error, "Leased seat was not held");
            return smallvec![Effect::None];
        }

        tracing::info!(event = %state.definition.name, %seat, "Lease expired");
        metrics::record_lease_expired();
        smallvec![Self::publish(
            env,
            &state.definition.name,
            vec![Notification::seat(seat, SeatStatus::Available, None)],
        )]
    }

    /// Publish `notifications` in order, inside the critical section
    fn publish(
        env: &EventEnvironment,
        event: &EventName,
        notifications: Vec<Notification>,
    ) -> Effect<EventAction> {
        if notifications.is_empty() {
            return Effect::None;
        }

        let fanout = Arc::clone(&env.fanout);
        let event = event.clone();
        Effect::run(move || {
            for notification in notifications {
                fanout.publish(&event, notification);
            }
        })
    }

    /// Write the sale to the ledger with backoff. Only an exhausted retry
    /// budget comes back, as `LedgerWriteFailed`.
    fn record_purchase(env: &EventEnvironment, record: PurchaseRecord) -> Effect<EventAction> {
        let ledger = Arc::clone(&env.ledger);
        let policy = env.ledger_retry.clone();

        async_effect! {
            let outcome = retry_with_backoff(&policy, "ledger.record_purchase", || {
                ledger.record_purchase(record.clone())
            })
            .await;

            match outcome {
                Ok(tickets) => {
                    tracing::debug!(
                        event = %record.event,
                        buyer = %record.buyer,
                        tickets = tickets.len(),
                        "Purchase recorded"
                    );
                    None
                },
                Err(error) => Some(EventAction::LedgerWriteFailed {
                    record,
                    error: error.to_string(),
                }),
            }
        }
    }
}

impl Reducer for EventReducer {
    type State = EventState;
    type Action = EventAction;
    type Environment = EventEnvironment;

    fn reduce(
        &self,
        state: &mut EventState,
        action: EventAction,
        env: &EventEnvironment,
    ) -> Effects {
        match action {
            EventAction::Hold {
                buyer,
                seats,
                reply,
            } => match Self::hold(state, env, &buyer, seats) {
                Ok((receipt, mut effects)) => {
                    tracing::debug!(event = %state.definition.name, buyer = %buyer, seats = receipt.seats.len(), "Seats held");
                    effects.push(reply!(reply, Ok(receipt)));
                    effects
                },
                Err(error) => {
                    tracing::debug!(event = %state.definition.name, buyer = %buyer, %error, "Hold rejected");
                    metrics::record_rejected("hold", error.code());
                    smallvec![reply!(reply, Err(error))]
                },
            },

            EventAction::Unhold {
                buyer,
                seats,
                reply,
            } => match Self::unhold(state, env, &buyer, seats) {
                Ok(mut effects) => {
                    effects.push(reply!(reply, Ok(())));
                    effects
                },
                Err(error) => {
                    metrics::record_rejected("unhold", error.code());
                    smallvec![reply!(reply, Err(error))]
                },
            },

            EventAction::Purchase {
                buyer,
                seats,
                reply,
            } => match Self::purchase(state, env, &buyer, seats) {
                Ok((receipt, mut effects)) => {
                    tracing::info!(event = %state.definition.name, buyer = %buyer, tickets = receipt.ticket_count, "Purchase completed");
                    effects.push(reply!(reply, Ok(receipt)));
                    effects
                },
                Err(error) => {
                    tracing::debug!(event = %state.definition.name, buyer = %buyer, %error, "Purchase rejected");
                    metrics::record_rejected("purchase", error.code());
                    smallvec![reply!(reply, Err(error))]
                },
            },

            EventAction::JoinQueue { buyer, reply } => {
                let (status, (before, after)) = state.admission.join(&buyer);
                metrics::record_queue_join(status.admitted);
                tracing::debug!(
                    event = %state.definition.name,
                    buyer = %buyer,
                    admitted = status.admitted,
                    position = status.position,
                    "Joined queue"
                );

                let update = if before == after {
                    Effect::None
                } else {
                    Self::publish(env, &state.definition.name, vec![Notification::queue(after)])
                };
                smallvec![update, reply!(reply, status)]
            },

            EventAction::LeaveQueue { buyer, reply } => {
                let (before, after) = state.admission.leave(&buyer);
                tracing::debug!(event = %state.definition.name, buyer = %buyer, "Left queue");

                let update = if before == after {
                    Effect::None
                } else {
                    Self::publish(env, &state.definition.name, vec![Notification::queue(after)])
                };
                smallvec![update, reply!(reply, ())]
            },

            EventAction::LeaseExpired { seat, lease } => Self::expire(state, env, seat, lease),

            EventAction::LedgerWriteFailed { record, error } => {
                tracing::warn!(
                    event = %record.event,
                    buyer = %record.buyer,
                    seats = record.seats.len(),
                    %error,
                    "Ledger write failed, sale kept for reconciliation"
                );
                metrics::record_ledger_failure();
                state.unrecorded.push(UnrecordedPurchase { record, error });
                smallvec![Effect::None]
            },
        }
    }
}

/// Drop repeated coordinates, keeping the first occurrence
fn dedupe(seats: Vec<Seat>) -> Vec<Seat> {
    let mut seen = HashSet::with_capacity(seats.len());
    seats.into_iter().filter(|seat| seen.insert(*seat)).collect()
}

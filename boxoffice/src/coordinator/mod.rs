//! Per-event coordinator.
//!
//! Each event is a [`Store`](seatlease_runtime::Store) running the
//! [`EventReducer`]. Requests, lease timer fires and ledger outcomes are all
//! actions on that store, so they are applied one at a time in arrival order:
//!
//! ```text
//! hold ─────┐
//! unhold ───┤
//! purchase ─┼──> store (write lock) ──> EventReducer ──> effects
//! join ─────┤                                             │
//! leave ────┤        LeaseExpired <── cancellable delay <─┤
//!           └──────  LedgerWriteFailed <── ledger write <─┤
//!                                     fanout publish  <───┘ (inside the lock)
//! ```

pub mod actions;
pub mod environment;
pub mod handle;
pub mod reducer;
pub mod state;

pub use actions::EventAction;
pub use environment::{DEFAULT_HOLD_TTL, EventEnvironment};
pub use handle::{EventCoordinator, EventStore};
pub use reducer::EventReducer;
pub use state::{EventState, UnrecordedPurchase};

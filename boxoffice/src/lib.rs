//! Box office - live seat leases and admission queues for ticketed events.
//!
//! Buyers hold seats for a bounded time, release them, or buy them. Popular
//! events can be gated: only buyers admitted from a FIFO queue into a bounded
//! active set may trade. Observers follow every seat and queue change live.
//!
//! # Architecture
//!
//! ```text
//!  HTTP / WebSocket (api, server)
//!            │
//!            ▼
//!  ┌──────────────────┐   get / create / list   ┌────────────────┐
//!  │     Registry     │ ──────────────────────> │    Catalog     │
//!  └──────────────────┘                         └────────────────┘
//!            │ one per event
//!            ▼
//!  ┌──────────────────────────────────────────┐
//!  │ EventCoordinator (Store + EventReducer)  │
//!  │  ┌──────────┐ ┌───────────┐ ┌──────────┐ │
//!  │  │ SeatGrid │ │ Lease set │ │Admission │ │
//!  │  └──────────┘ └───────────┘ └──────────┘ │
//!  └──────────────────────────────────────────┘
//!            │                        │
//!            ▼                        ▼
//!     FanoutPublisher              Ledger
//!   (seat:update, queue:update)  (best effort)
//! ```
//!
//! # Key Guarantees
//!
//! - Every operation on an event runs alone, in arrival order. A seat is
//!   never held or sold twice.
//! - Group requests are all or nothing.
//! - A lease releases its seat exactly once, unless it is cancelled first by
//!   an unhold or a purchase.
//! - A sale is final even when the ledger cannot record it.
//!
//! # Usage
//!
//! ```ignore
//! let registry = Registry::new(EventEnvironment::new(fanout, ledger));
//! let event = registry.create(EventDefinition::new("Starfall Live", 10, 20)).await?;
//!
//! let receipt = event.hold(&"ada".into(), vec![Seat::new(0, 0)]).await?;
//! event.purchase(&"ada".into(), vec![Seat::new(0, 0)]).await?;
//! ```

#![forbid(unsafe_code)]

pub mod admission;
pub mod api;
pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod fanout;
pub mod grid;
pub mod identity;
pub mod lease;
pub mod ledger;
pub mod metrics;
#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;
pub mod registry;
pub mod seed;
pub mod server;
pub mod types;

pub use config::Config;
pub use coordinator::{EventCoordinator, EventEnvironment};
pub use error::BoxOfficeError;
pub use fanout::{BroadcastFanout, FanoutPublisher, Notification};
pub use registry::Registry;
pub use server::{AppState, build_router};
pub use types::{
    BuyerId, EventDefinition, EventDetail, EventName, EventSummary, HoldReceipt, PurchaseReceipt,
    QueueStatus, Seat, SeatStatus,
};

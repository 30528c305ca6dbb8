//! Dependencies injected into every event reducer.

use chrono::{DateTime, TimeDelta, Utc};
use seatlease_core::{Clock, SystemClock};
use seatlease_runtime::retry::RetryPolicy;
use std::sync::Arc;
use std::time::Duration;

use crate::fanout::FanoutPublisher;
use crate::ledger::Ledger;

/// Default lease length: two minutes.
pub const DEFAULT_HOLD_TTL: Duration = Duration::from_secs(120);

/// Collaborators and tunables shared by all events of a process.
#[derive(Clone)]
pub struct EventEnvironment {
    /// Source of `expiresAt` and purchase timestamps
    pub clock: Arc<dyn Clock>,
    /// Where seat and queue notifications go
    pub fanout: Arc<dyn FanoutPublisher>,
    /// Where completed sales are recorded
    pub ledger: Arc<dyn Ledger>,
    /// Lease length
    pub hold_ttl: Duration,
    /// Backoff for ledger writes
    pub ledger_retry: RetryPolicy,
}

impl EventEnvironment {
    /// Environment on the system clock with the default lease length
    #[must_use]
    pub fn new(fanout: Arc<dyn FanoutPublisher>, ledger: Arc<dyn Ledger>) -> Self {
        Self {
            clock: Arc::new(SystemClock),
            fanout,
            ledger,
            hold_ttl: DEFAULT_HOLD_TTL,
            ledger_retry: RetryPolicy::default(),
        }
    }

    /// Replace the clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the lease length
    #[must_use]
    pub fn with_hold_ttl(mut self, hold_ttl: Duration) -> Self {
        self.hold_ttl = hold_ttl;
        self
    }

    /// Replace the ledger retry policy
    #[must_use]
    pub fn with_ledger_retry(mut self, policy: RetryPolicy) -> Self {
        self.ledger_retry = policy;
        self
    }

    /// When a lease granted at `now` lapses
    #[must_use]
    pub fn lease_expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        TimeDelta::from_std(self.hold_ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Lease length in whole milliseconds
    #[must_use]
    pub fn hold_ttl_ms(&self) -> u64 {
        u64::try_from(self.hold_ttl.as_millis()).unwrap_or(u64::MAX)
    }
}

//! Application state for the box office HTTP server.
//!
//! Contains all shared resources needed by HTTP handlers:
//! - The event registry (one coordinator per event)
//! - The broadcast fanout live feeds subscribe to
//! - Session issuing and token verification
//! - The purchase ledger

use seatlease_runtime::StoreConfig;
use seatlease_runtime::retry::RetryPolicy;
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::coordinator::EventEnvironment;
use crate::fanout::BroadcastFanout;
use crate::identity::{IdentityProvider, SessionIdentity};
use crate::ledger::{InMemoryLedger, Ledger};
use crate::registry::Registry;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply via Arc) for each request.
#[derive(Clone)]
pub struct AppState {
    /// Event name → coordinator
    pub registry: Arc<Registry>,

    /// Per-event notification channels
    pub fanout: Arc<BroadcastFanout>,

    /// Issues and revokes session tokens
    pub sessions: Arc<SessionIdentity>,

    /// Verifies bearer tokens
    pub identity: Arc<dyn IdentityProvider>,

    /// Record of completed sales
    pub ledger: Arc<dyn Ledger>,

    /// Loaded configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire a complete in-process box office from `config`.
    ///
    /// Events missing from the registry are looked up in `catalog`.
    #[must_use]
    pub fn new(config: Config, catalog: Arc<dyn Catalog>) -> Self {
        let fanout = Arc::new(BroadcastFanout::new(config.boxoffice.fanout_capacity));
        let ledger: Arc<dyn Ledger> = Arc::new(InMemoryLedger::new());
        let sessions = Arc::new(SessionIdentity::new());

        let env = EventEnvironment::new(fanout.clone(), Arc::clone(&ledger))
            .with_hold_ttl(config.boxoffice.hold_ttl())
            .with_ledger_retry(
                RetryPolicy::builder()
                    .max_retries(config.boxoffice.ledger_max_retries)
                    .initial_delay(config.boxoffice.ledger_retry_delay())
                    .build(),
            );

        let registry = Registry::new(env)
            .with_store_config(StoreConfig::default().with_shutdown_timeout(config.server.shutdown_timeout()))
            .with_max_seats(config.boxoffice.max_seats)
            .with_catalog(catalog);

        Self {
            registry: Arc::new(registry),
            fanout,
            identity: sessions.clone(),
            sessions,
            ledger,
            config: Arc::new(config),
        }
    }

    /// Verify bearer tokens with `identity` instead of the session table
    #[must_use]
    pub fn with_identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = identity;
        self
    }
}

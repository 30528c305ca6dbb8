//! Ticket ledger.
//!
//! Recording a purchase is best-effort: by the time the ledger is called the
//! seats are already sold, and a ledger failure never un-sells them.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

use crate::types::{BuyerId, PurchaseRecord, Ticket};

/// Ledger failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The backing store rejected or lost the write
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

type LedgerFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, LedgerError>> + Send + 'a>>;

/// Durable record of issued tickets.
pub trait Ledger: Send + Sync {
    /// Persist a completed sale and return the tickets it produced
    fn record_purchase(&self, record: PurchaseRecord) -> LedgerFuture<'_, Vec<Ticket>>;

    /// Tickets owned by `buyer`, oldest first
    fn tickets_for<'a>(&'a self, buyer: &'a BuyerId) -> LedgerFuture<'a, Vec<Ticket>>;
}

/// Ledger kept in process memory.
#[derive(Default)]
pub struct InMemoryLedger {
    tickets: RwLock<HashMap<BuyerId, Vec<Ticket>>>,
}

impl InMemoryLedger {
    /// An empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total tickets recorded
    #[must_use]
    pub fn ticket_count(&self) -> usize {
        self.tickets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(Vec::len)
            .sum()
    }
}

impl Ledger for InMemoryLedger {
    fn record_purchase(&self, record: PurchaseRecord) -> LedgerFuture<'_, Vec<Ticket>> {
        let issued = Ticket::issue(&record);
        self.tickets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(record.buyer)
            .or_default()
            .extend(issued.iter().cloned());
        Box::pin(async move { Ok(issued) })
    }

    fn tickets_for<'a>(&'a self, buyer: &'a BuyerId) -> LedgerFuture<'a, Vec<Ticket>> {
        let tickets = self
            .tickets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(buyer)
            .cloned()
            .unwrap_or_default();
        Box::pin(async move { Ok(tickets) })
    }
}

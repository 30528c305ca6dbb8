//! Domain types for the box office.
//!
//! Identifiers, seat coordinates, event definitions and the receipts returned
//! to callers. Wire-facing structs serialize in camelCase and carry
//! timestamps as epoch milliseconds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::BoxOfficeError;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique, human-readable name of an event. Names are the registry key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventName(String);

impl EventName {
    /// Create an event name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EventName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for EventName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Opaque, already-verified buyer identity.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuyerId(String);

impl BuyerId {
    /// Create a buyer id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuyerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BuyerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for BuyerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier of one granted lease.
///
/// Every hold gets a fresh id so that an expiry scheduled for an earlier
/// lease of the same seat can recognise itself as stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LeaseId(u64);

impl LeaseId {
    /// Create a lease id from its sequence number
    #[must_use]
    pub const fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Sequence number of this lease
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LeaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Seats
// ============================================================================

/// Seat coordinate, zero-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Seat {
    /// Row index
    pub row: u32,
    /// Column index
    pub col: u32,
}

impl Seat {
    /// Create a seat coordinate
    #[must_use]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Lifecycle state of a seat. `Sold` is terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    /// Free to hold or buy
    #[default]
    Available,
    /// Leased to one buyer until the lease expires
    Held,
    /// Bought
    Sold,
}

impl SeatStatus {
    /// Lowercase label, as used on the wire and in metrics
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Held => "held",
            Self::Sold => "sold",
        }
    }
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Event definitions
// ============================================================================

/// Default size of the active set of a gated event.
pub const DEFAULT_MAX_ACTIVE: usize = 10;

/// Largest seat grid an event may have.
pub const MAX_SEATS: u64 = 250_000;

fn default_max_active() -> usize {
    DEFAULT_MAX_ACTIVE
}

fn default_category() -> String {
    "Concerts".to_string()
}

fn default_location() -> String {
    "TBD Arena".to_string()
}

fn empty_meta() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Everything needed to open an event for sale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDefinition {
    /// Unique name
    pub name: EventName,
    /// Number of rows in the seat grid
    pub rows: u32,
    /// Number of columns in the seat grid
    pub cols: u32,
    /// Whether trading requires admission through the queue
    #[serde(default)]
    pub gated: bool,
    /// Capacity of the active set (gated events only)
    #[serde(default = "default_max_active")]
    pub max_active: usize,
    /// Listing category ("Movies", "Concerts", ...)
    #[serde(default = "default_category")]
    pub category: String,
    /// Venue / city
    #[serde(default = "default_location")]
    pub location: String,
    /// Start of the event
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    /// Free-form listing metadata
    #[serde(default = "empty_meta")]
    pub meta: serde_json::Value,
}

impl EventDefinition {
    /// Definition with listing defaults: not gated, default active set size.
    #[must_use]
    pub fn new(name: impl Into<EventName>, rows: u32, cols: u32) -> Self {
        Self {
            name: name.into(),
            rows,
            cols,
            gated: false,
            max_active: DEFAULT_MAX_ACTIVE,
            category: default_category(),
            location: default_location(),
            starts_at: None,
            meta: empty_meta(),
        }
    }

    /// Require admission through the queue
    #[must_use]
    pub fn gated(mut self, gated: bool) -> Self {
        self.gated = gated;
        self
    }

    /// Set the active set capacity
    #[must_use]
    pub fn with_max_active(mut self, max_active: usize) -> Self {
        self.max_active = max_active;
        self
    }

    /// Set the listing category
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the venue
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Set the start time
    #[must_use]
    pub fn starting_at(mut self, starts_at: DateTime<Utc>) -> Self {
        self.starts_at = Some(starts_at);
        self
    }

    /// Attach listing metadata
    #[must_use]
    pub fn with_meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = meta;
        self
    }

    /// Number of seats in the grid
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Check the definition can back a coordinator.
    ///
    /// # Errors
    ///
    /// Returns [`BoxOfficeError::InvalidDefinition`] for an empty name, an
    /// empty grid, a grid over [`MAX_SEATS`] or a zero-sized active set.
    pub fn validate(&self) -> Result<(), BoxOfficeError> {
        self.validate_within(MAX_SEATS)
    }

    /// [`validate`](Self::validate) with a tighter seat limit.
    ///
    /// # Errors
    ///
    /// Same as [`validate`](Self::validate), with `max_seats` (capped at
    /// [`MAX_SEATS`]) as the grid limit.
    pub fn validate_within(&self, max_seats: u64) -> Result<(), BoxOfficeError> {
        if self.name.as_str().trim().is_empty() {
            return Err(BoxOfficeError::InvalidDefinition(
                "name must not be empty".to_string(),
            ));
        }
        if self.rows == 0 || self.cols == 0 {
            return Err(BoxOfficeError::InvalidDefinition(format!(
                "grid must have at least one seat (rows: {}, cols: {})",
                self.rows, self.cols
            )));
        }
        let limit = max_seats.min(MAX_SEATS);
        let seats = u64::from(self.rows) * u64::from(self.cols);
        if seats > limit {
            return Err(BoxOfficeError::InvalidDefinition(format!(
                "grid of {seats} seats exceeds the limit of {limit} (rows: {}, cols: {})",
                self.rows, self.cols
            )));
        }
        if self.max_active == 0 {
            return Err(BoxOfficeError::InvalidDefinition(
                "maxActive must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Read models
// ============================================================================

/// Listing entry for an event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    /// Event name
    pub name: EventName,
    /// Listing category
    pub category: String,
    /// Venue
    pub location: String,
    /// Start of the event
    pub starts_at: Option<DateTime<Utc>>,
    /// Grid rows
    pub rows: u32,
    /// Grid columns
    pub cols: u32,
    /// Whether trading requires admission
    pub gated: bool,
    /// Active set capacity
    pub max_active: usize,
    /// Seats currently available
    pub available: usize,
    /// Seats currently held
    pub held: usize,
    /// Seats sold
    pub sold: usize,
    /// Listing metadata
    pub meta: serde_json::Value,
}

/// Full view of one event: summary, seat grid and admission counts.
///
/// Taken in one read of the coordinator's state, so the grid and the
/// counts are mutually consistent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetail {
    /// Listing fields and seat counts
    #[serde(flatten)]
    pub summary: EventSummary,
    /// Seat states, `seats[row][col]`
    pub seats: Vec<Vec<SeatStatus>>,
    /// Buyers currently admitted
    pub active_count: usize,
    /// Buyers waiting in the queue
    pub queue_length: usize,
}

// ============================================================================
// Receipts
// ============================================================================

/// One seat of a successful hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeasedSeat {
    /// Row index
    pub row: u32,
    /// Column index
    pub col: u32,
    /// When the lease lapses
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
}

/// Result of a successful hold.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldReceipt {
    /// When every lease of this hold lapses
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
    /// Lease length in milliseconds
    pub expires_in_ms: u64,
    /// Leased seats in request order
    pub seats: Vec<LeasedSeat>,
}

/// Result of a successful purchase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    /// Number of tickets issued
    pub ticket_count: usize,
    /// Seats bought, in request order
    pub seats: Vec<Seat>,
}

/// Admission state of one buyer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    /// Whether the buyer may trade
    pub admitted: bool,
    /// 1-based queue position, 0 when admitted or unknown
    pub position: usize,
    /// Size of the active set
    pub active_count: usize,
    /// Length of the waiting queue
    pub queue_length: usize,
}

// ============================================================================
// Ledger records
// ============================================================================

/// A completed sale handed to the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    /// Buyer
    pub buyer: BuyerId,
    /// Event
    pub event: EventName,
    /// Seats bought
    pub seats: Vec<Seat>,
    /// When the sale committed
    pub purchased_at: DateTime<Utc>,
}

/// One issued ticket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Ticket id
    pub id: Uuid,
    /// Owner
    pub buyer: BuyerId,
    /// Event
    pub event: EventName,
    /// Row index
    pub row: u32,
    /// Column index
    pub col: u32,
    /// When the sale committed
    pub purchased_at: DateTime<Utc>,
}

impl Ticket {
    /// Issue one ticket per seat of a purchase
    #[must_use]
    pub fn issue(record: &PurchaseRecord) -> Vec<Self> {
        record
            .seats
            .iter()
            .map(|seat| Self {
                id: Uuid::new_v4(),
                buyer: record.buyer.clone(),
                event: record.event.clone(),
                row: seat.row,
                col: seat.col,
                purchased_at: record.purchased_at,
            })
            .collect()
    }
}

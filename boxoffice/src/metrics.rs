//! Business metrics for the box office.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `boxoffice_holds_total` - Seats leased
//! - `boxoffice_unholds_total` - Seats released by their holder
//! - `boxoffice_leases_expired_total` - Leases that ran out
//! - `boxoffice_tickets_sold_total` - Seats sold
//! - `boxoffice_purchases_total` - Completed purchases
//! - `boxoffice_rejections_total{operation, reason}` - Rejected requests
//! - `boxoffice_queue_joins_total{admitted}` - Queue joins
//! - `boxoffice_ledger_failures_total` - Sales the ledger never recorded
//! - `boxoffice_notifications_total{type}` - Notifications fanned out
//! - `boxoffice_events_created_total` - Events opened
//!
//! ## Histograms
//! - `boxoffice_seats_per_purchase` - Seats per completed purchase

use metrics::{describe_counter, describe_histogram};

/// Register descriptions for every business metric.
///
/// Call once at startup, after the recorder is installed.
pub fn register_business_metrics() {
    describe_counter!("boxoffice_holds_total", "Seats leased to buyers");
    describe_counter!("boxoffice_unholds_total", "Seats released by their holder");
    describe_counter!("boxoffice_leases_expired_total", "Leases that ran out before purchase");
    describe_counter!("boxoffice_tickets_sold_total", "Seats sold");
    describe_counter!("boxoffice_purchases_total", "Completed purchases");
    describe_histogram!("boxoffice_seats_per_purchase", "Seats bought per purchase");
    describe_counter!(
        "boxoffice_rejections_total",
        "Rejected trading requests by operation and reason"
    );
    describe_counter!("boxoffice_queue_joins_total", "Admission queue joins");
    describe_counter!(
        "boxoffice_ledger_failures_total",
        "Sales the ledger failed to record after retrying"
    );
    describe_counter!("boxoffice_notifications_total", "Notifications fanned out, by type");
    describe_counter!("boxoffice_events_created_total", "Events opened for sale");

    tracing::info!("Business metrics registered");
}

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Seats leased by one hold
pub fn record_hold(seats: usize) {
    metrics::counter!("boxoffice_holds_total").increment(seats as u64);
}

/// Seats released by one unhold
pub fn record_unhold(seats: usize) {
    if seats > 0 {
        metrics::counter!("boxoffice_unholds_total").increment(seats as u64);
    }
}

/// A lease ran out
pub fn record_lease_expired() {
    metrics::counter!("boxoffice_leases_expired_total").increment(1);
}

/// A purchase of `seats` seats committed
#[allow(clippy::cast_precision_loss)]
pub fn record_purchase(seats: usize) {
    metrics::counter!("boxoffice_purchases_total").increment(1);
    metrics::counter!("boxoffice_tickets_sold_total").increment(seats as u64);
    metrics::histogram!("boxoffice_seats_per_purchase").record(seats as f64);
}

/// A trading request was refused
pub fn record_rejected(operation: &'static str, reason: &'static str) {
    metrics::counter!("boxoffice_rejections_total", "operation" => operation, "reason" => reason)
        .increment(1);
}

/// A buyer joined a queue
pub fn record_queue_join(admitted: bool) {
    let admitted = if admitted { "true" } else { "false" };
    metrics::counter!("boxoffice_queue_joins_total", "admitted" => admitted).increment(1);
}

/// A sale could not be recorded
pub fn record_ledger_failure() {
    metrics::counter!("boxoffice_ledger_failures_total").increment(1);
}

/// A notification went out
pub fn record_notification(kind: &'static str) {
    metrics::counter!("boxoffice_notifications_total", "type" => kind).increment(1);
}

/// An event was opened
pub fn record_event_created() {
    metrics::counter!("boxoffice_events_created_total").increment(1);
}

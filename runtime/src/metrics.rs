//! Prometheus metrics for observability and monitoring.
//!
//! The store records reducer and effect metrics through the `metrics` facade;
//! [`MetricsServer`] installs the Prometheus recorder and renders the text
//! exposition format for a `/metrics` endpoint.
//!
//! # Example
//!
//! ```rust,no_run
//! use seatlease_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//! let body = server.render();
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use thiserror::Error;

// Re-export metrics macros for use in other crates
pub use metrics::{counter, gauge, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus metrics recorder and renderer.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server for the given address.
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Address the metrics endpoint should be served on.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// A recorder that is already installed (e.g. in tests) is not an error;
    /// the call logs a warning and leaves `render()` returning `None`.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                register_metrics();
                self.handle = Some(handle);
                tracing::info!(addr = %self.addr, "Metrics recorder installed");
                Ok(())
            },
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            },
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if the recorder hasn't been installed by this server.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

fn register_metrics() {
    describe_counter!("store.commands.total", "Actions processed by stores");
    describe_histogram!(
        "store.reducer.duration_seconds",
        "Time spent inside reducers (under the store write lock)"
    );
    describe_counter!("store.effects.executed", "Effects executed, labelled by kind");
    describe_counter!(
        "store.shutdown.rejected_actions",
        "Actions rejected because the store was shutting down"
    );
    describe_counter!("retry.attempts", "Retries scheduled, labelled by operation");
    describe_counter!("retry.success", "Operations that succeeded after retrying");
    describe_counter!("retry.exhausted", "Operations that failed after all retries");
    describe_gauge!("process.stores", "Stores currently registered");
}

/// Retry metrics recorder.
pub struct RetryMetrics;

impl RetryMetrics {
    /// Record a scheduled retry.
    pub fn record_attempt(operation: &'static str) {
        counter!("retry.attempts", "operation" => operation).increment(1);
    }

    /// Record a success after at least one retry.
    pub fn record_success(operation: &'static str) {
        counter!("retry.success", "operation" => operation).increment(1);
    }

    /// Record exhausted retries.
    pub fn record_exhausted(operation: &'static str) {
        counter!("retry.exhausted", "operation" => operation).increment(1);
    }
}

/// Store registry gauge.
pub struct StoreMetrics;

impl StoreMetrics {
    /// Record the number of live stores.
    #[allow(clippy::cast_precision_loss)]
    pub fn record_store_count(count: usize) {
        gauge!("process.stores").set(count as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_without_recorder_renders_nothing() {
        let server = MetricsServer::new(([127, 0, 0, 1], 9090).into());
        assert!(server.handle().is_none());
        assert!(server.render().is_none());
        assert_eq!(server.addr().port(), 9090);
    }

    #[test]
    fn recorders_are_safe_without_installed_exporter() {
        RetryMetrics::record_attempt("test");
        RetryMetrics::record_success("test");
        RetryMetrics::record_exhausted("test");
        StoreMetrics::record_store_count(3);
    }
}

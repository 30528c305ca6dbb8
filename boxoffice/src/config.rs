//! Configuration management for the box office.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Trading and admission configuration
    pub boxoffice: BoxOfficeConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Prometheus endpoint port; no exporter when unset
    pub metrics_port: Option<u16>,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
}

/// Trading configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxOfficeConfig {
    /// Lease duration of a hold, in milliseconds
    pub hold_ms: u64,
    /// Active-set size for gated events created without one
    pub max_active: usize,
    /// Rows of events created without a size
    pub default_rows: u32,
    /// Columns of events created without a size
    pub default_cols: u32,
    /// Largest seat grid an event may be created with
    pub max_seats: u64,
    /// Buffered notifications per live-feed channel
    pub fanout_capacity: usize,
    /// Ledger write retries after the first attempt
    pub ledger_max_retries: usize,
    /// Delay before the first ledger retry, in milliseconds
    pub ledger_retry_delay_ms: u64,
    /// Populate the catalog with demo events at boot
    pub seed_demo_events: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            metrics_port: None,
            shutdown_timeout: 30,
        }
    }
}

impl Default for BoxOfficeConfig {
    fn default() -> Self {
        Self {
            hold_ms: 120_000,
            max_active: crate::types::DEFAULT_MAX_ACTIVE,
            default_rows: 12,
            default_cols: 15,
            max_seats: crate::types::MAX_SEATS,
            fanout_capacity: 1024,
            ledger_max_retries: 3,
            ledger_retry_delay_ms: 100,
            seed_demo_events: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            server: ServerConfig {
                host: lookup("HOST").unwrap_or(defaults.server.host),
                port: parse(&lookup, "PORT").unwrap_or(defaults.server.port),
                log_level: lookup("RUST_LOG").unwrap_or(defaults.server.log_level),
                metrics_port: parse(&lookup, "METRICS_PORT"),
                shutdown_timeout: parse(&lookup, "SHUTDOWN_TIMEOUT")
                    .unwrap_or(defaults.server.shutdown_timeout),
            },
            boxoffice: BoxOfficeConfig {
                hold_ms: parse::<u64>(&lookup, "HOLD_MS")
                    .filter(|ms| *ms > 0)
                    .unwrap_or(defaults.boxoffice.hold_ms),
                max_active: parse::<usize>(&lookup, "MAX_ACTIVE")
                    .filter(|n| *n > 0)
                    .unwrap_or(defaults.boxoffice.max_active),
                default_rows: parse(&lookup, "DEFAULT_ROWS").unwrap_or(defaults.boxoffice.default_rows),
                default_cols: parse(&lookup, "DEFAULT_COLS").unwrap_or(defaults.boxoffice.default_cols),
                max_seats: parse::<u64>(&lookup, "MAX_SEATS")
                    .filter(|n| *n > 0)
                    .unwrap_or(defaults.boxoffice.max_seats),
                fanout_capacity: parse::<usize>(&lookup, "FANOUT_CAPACITY")
                    .filter(|n| *n > 0)
                    .unwrap_or(defaults.boxoffice.fanout_capacity),
                ledger_max_retries: parse(&lookup, "LEDGER_MAX_RETRIES")
                    .unwrap_or(defaults.boxoffice.ledger_max_retries),
                ledger_retry_delay_ms: parse(&lookup, "LEDGER_RETRY_DELAY_MS")
                    .unwrap_or(defaults.boxoffice.ledger_retry_delay_ms),
                seed_demo_events: parse(&lookup, "SEED_DEMO_EVENTS")
                    .unwrap_or(defaults.boxoffice.seed_demo_events),
            },
        }
    }

    /// Address the HTTP server binds to
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|s| s.trim().parse().ok())
}

impl ServerConfig {
    /// Graceful shutdown timeout
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }
}

impl BoxOfficeConfig {
    /// Lease duration of a hold
    #[must_use]
    pub const fn hold_ttl(&self) -> Duration {
        Duration::from_millis(self.hold_ms)
    }

    /// Delay before the first ledger retry
    #[must_use]
    pub const fn ledger_retry_delay(&self) -> Duration {
        Duration::from_millis(self.ledger_retry_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.metrics_port, None);
        assert_eq!(config.boxoffice.hold_ttl(), Duration::from_secs(120));
        assert_eq!(config.boxoffice.max_active, 10);
        assert_eq!((config.boxoffice.default_rows, config.boxoffice.default_cols), (12, 15));
        assert!(config.boxoffice.seed_demo_events);
        assert_eq!(config.boxoffice.max_seats, crate::types::MAX_SEATS);
    }

    #[test]
    fn variables_override_defaults() {
        let config = config_from(&[
            ("PORT", "9000"),
            ("METRICS_PORT", "9100"),
            ("HOLD_MS", "5000"),
            ("MAX_ACTIVE", "2"),
            ("MAX_SEATS", "5000"),
            ("SEED_DEMO_EVENTS", "false"),
        ]);
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.server.metrics_port, Some(9100));
        assert_eq!(config.boxoffice.hold_ms, 5000);
        assert_eq!(config.boxoffice.max_active, 2);
        assert_eq!(config.boxoffice.max_seats, 5000);
        assert!(!config.boxoffice.seed_demo_events);
    }

    #[test]
    fn unparsable_or_zero_values_fall_back() {
        let config = config_from(&[("PORT", "eighty"), ("HOLD_MS", "0"), ("MAX_ACTIVE", "-1")]);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.boxoffice.hold_ms, 120_000);
        assert_eq!(config.boxoffice.max_active, 10);
    }
}

//! Box Office Server
//!
//! Runs the HTTP/WebSocket API over an in-process registry of events.
//!
//! This binary:
//! - Loads configuration from the environment (and `.env`)
//! - Optionally installs the Prometheus recorder and serves `/metrics`
//! - Seeds the catalog with demo events and opens them
//! - Serves the API until Ctrl+C, then closes every event
//!
//! # Usage
//!
//! ```bash
//! PORT=8080 METRICS_PORT=9100 cargo run --bin boxoffice-server
//! ```

use axum::{Router, routing::get};
use boxoffice::catalog::InMemoryCatalog;
use boxoffice::metrics::register_business_metrics;
use boxoffice::seed::demo_definitions;
use boxoffice::{AppState, Config, build_router};
use seatlease_runtime::metrics::MetricsServer;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,boxoffice=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🎟  Starting Box Office Server...");

    let config = Config::from_env();
    tracing::info!(
        addr = %config.bind_addr(),
        hold_ms = config.boxoffice.hold_ms,
        max_active = config.boxoffice.max_active,
        "Configuration loaded"
    );

    if let Some(port) = config.server.metrics_port {
        start_metrics(SocketAddr::from(([0, 0, 0, 0], port))).await?;
    }

    let catalog = Arc::new(InMemoryCatalog::new());
    if config.boxoffice.seed_demo_events {
        let definitions = {
            let mut rng = rand::thread_rng();
            demo_definitions(
                config.boxoffice.default_rows,
                config.boxoffice.default_cols,
                chrono::Utc::now(),
                &mut rng,
            )
        };
        for definition in definitions {
            catalog.insert(definition);
        }
        tracing::info!(events = catalog.len(), "✓ Demo catalog seeded");
    }

    let state = AppState::new(config.clone(), catalog);
    let opened = state.registry.bootstrap().await?;
    tracing::info!(opened, "✓ Events opened");

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %listener.local_addr()?, "🎟  Box Office Server is running!");
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(listener, build_router(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down gracefully...");
    let timed_out = state.registry.shutdown().await;
    if timed_out > 0 {
        tracing::warn!(timed_out, "Some events did not close within the shutdown timeout");
    }
    tracing::info!("✓ Shutdown complete");
    Ok(())
}

/// Install the Prometheus recorder and serve it on `addr`.
async fn start_metrics(addr: SocketAddr) -> anyhow::Result<()> {
    let mut server = MetricsServer::new(addr);
    server.start()?;
    register_business_metrics();

    let server = Arc::new(server);
    let router = Router::new().route(
        "/metrics",
        get(move || {
            let server = Arc::clone(&server);
            async move { server.render().unwrap_or_default() }
        }),
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "✓ Metrics endpoint listening");
    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router).await {
            tracing::error!(%error, "Metrics endpoint stopped");
        }
    });
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "Failed to listen for Ctrl+C");
    }
}

//! Health check endpoints.
//!
//! Used by load balancers and monitoring systems to verify the process is up.

use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Liveness response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the handler runs
    pub status: &'static str,
    /// Server time
    pub time: DateTime<Utc>,
}

/// Simple health check endpoint (liveness).
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// { "status": "ok", "time": "2025-01-01T00:00:00Z" }
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        time: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simple_health_check() {
        let Json(body) = health_check().await;
        assert_eq!(body.status, "ok");
    }
}

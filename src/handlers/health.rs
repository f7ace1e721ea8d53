//! Liveness endpoint.
//!
//! `GET /health` bypasses the security guard so load balancers and uptime
//! checks can reach it without an allowed origin.

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use tracing::instrument;

use crate::models::HealthResponse;
use crate::state::AppState;

/// Health check endpoint.
///
/// Always returns 200 OK.
///
/// # Response Body
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "timestamp": "2025-01-15T10:30:00Z",
///   "uptime_seconds": 3600,
///   "rate_limit_entries": 12
/// }
/// ```
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        uptime_seconds: state.uptime_seconds(),
        rate_limit_entries: state.guard.limiter().store().len(),
    })
}

//! Prometheus metrics for application observability.
//!
//! Metrics are exposed via a dedicated HTTP listener (default: `0.0.0.0:9090`).
//! Recording functions are no-ops until [`init_metrics`] installs a recorder,
//! so the security core and tests can call them unconditionally.
//!
//! # Available Metrics
//!
//! ## Counters
//! - `relay_security_rejections_total` - Requests rejected by the guard (label: reason)
//! - `relay_tokens_issued_total` - Session tokens minted
//! - `relay_upstream_requests_total` - Upstream calls (labels: provider, outcome)
//!
//! ## Histograms
//! - `relay_upstream_duration_seconds` - Upstream call duration (label: provider)
//!
//! ## Gauges
//! - `relay_rate_limit_entries` - Live entries in the rate-limit store
//!
//! # Usage
//!
//! ```rust,ignore
//! use relay_guard::metrics::{init_metrics, record_upstream_call};
//!
//! init_metrics("0.0.0.0:9090".parse()?)?;
//! record_upstream_call("deepl", "success", 0.120);
//! ```

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{error, info};

/// Metric names as constants for consistency.
pub mod names {
    pub const SECURITY_REJECTIONS_TOTAL: &str = "relay_security_rejections_total";
    pub const TOKENS_ISSUED_TOTAL: &str = "relay_tokens_issued_total";
    pub const UPSTREAM_REQUESTS_TOTAL: &str = "relay_upstream_requests_total";
    pub const UPSTREAM_DURATION_SECONDS: &str = "relay_upstream_duration_seconds";
    pub const RATE_LIMIT_ENTRIES: &str = "relay_rate_limit_entries";
}

/// Outcome labels for upstream calls.
pub mod outcome {
    pub const SUCCESS: &str = "success";
    pub const UPSTREAM_ERROR: &str = "upstream_error";
    pub const UNAVAILABLE: &str = "unavailable";
    pub const TIMEOUT: &str = "timeout";
}

/// Initialize the Prometheus metrics exporter.
///
/// # Errors
///
/// Returns a message if the exporter cannot be installed (port in use, or a
/// recorder already registered).
pub fn init_metrics(metrics_addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        names::SECURITY_REJECTIONS_TOTAL,
        "Total number of requests rejected by the security guard"
    );
    describe_counter!(
        names::TOKENS_ISSUED_TOTAL,
        "Total number of session tokens issued"
    );
    describe_counter!(
        names::UPSTREAM_REQUESTS_TOTAL,
        "Total number of calls made to upstream providers"
    );

    describe_histogram!(
        names::UPSTREAM_DURATION_SECONDS,
        "Upstream provider call duration in seconds"
    );

    describe_gauge!(
        names::RATE_LIMIT_ENTRIES,
        "Number of (client, window) counters held by the rate limiter"
    );

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Try to initialize metrics, logging any errors but not failing.
pub fn try_init_metrics(metrics_addr: SocketAddr) {
    if let Err(e) = init_metrics(metrics_addr) {
        error!(error = %e, "Failed to initialize metrics, continuing without metrics");
    }
}

// =============================================================================
// Counter Recording Functions
// =============================================================================

/// Record a request rejected by the security guard.
pub fn record_security_rejection(reason: &'static str) {
    counter!(names::SECURITY_REJECTIONS_TOTAL, "reason" => reason).increment(1);
}

/// Record a session token being issued.
pub fn record_token_issued() {
    counter!(names::TOKENS_ISSUED_TOTAL).increment(1);
}

/// Record one upstream call with its outcome and duration.
pub fn record_upstream_call(provider: &'static str, outcome: &'static str, duration_secs: f64) {
    counter!(names::UPSTREAM_REQUESTS_TOTAL, "provider" => provider, "outcome" => outcome)
        .increment(1);
    histogram!(names::UPSTREAM_DURATION_SECONDS, "provider" => provider).record(duration_secs);
}

// =============================================================================
// Gauge Recording Functions
// =============================================================================

/// Update the rate-limit store size gauge.
#[allow(clippy::cast_precision_loss)]
pub fn set_rate_limit_entries(entries: usize) {
    gauge!(names::RATE_LIMIT_ENTRIES).set(entries as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    // These only verify the functions don't panic without a recorder.

    #[test]
    fn test_record_security_rejection() {
        record_security_rejection("origin");
        record_security_rejection("rate_limit");
    }

    #[test]
    fn test_record_token_issued() {
        record_token_issued();
    }

    #[test]
    fn test_record_upstream_call() {
        record_upstream_call("deepl", outcome::SUCCESS, 0.1);
        record_upstream_call("deepl", outcome::TIMEOUT, 10.0);
    }

    #[test]
    fn test_set_rate_limit_entries() {
        set_rate_limit_entries(0);
        set_rate_limit_entries(42);
    }
}

//! Prometheus metrics for monitoring server health and league activity.
//!
//! Metrics are recorded through the `metrics` facade and exposed in Prometheus
//! text format when an exporter is installed with [`init_metrics`]. Without an
//! exporter every recording call is a no-op.
//!
//! # Metrics Categories
//!
//! - **HTTP Metrics**: Request counts and duration by method, route and status
//! - **Auth Metrics**: Login attempts
//! - **League Metrics**: Channels, tournaments and matches created, matches
//!   completed, denied authorization checks
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use leaguelink_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::http_requests_total("POST", "/api/v1/auth/login", 200);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

/// Collapse numeric path segments so ids do not explode label cardinality.
///
/// `/api/v1/matches/42/games` becomes `/api/v1/matches/{id}/games`.
pub fn route_label(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()) {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Auth Metrics
// ============================================================================

/// Increment login attempts counter.
pub fn login_attempts_total(success: bool) {
    metrics::counter!("login_attempts_total",
        "success" => success.to_string()
    )
    .increment(1);
}

/// Increment denied authorization checks.
pub fn authorization_denied_total() {
    metrics::counter!("authorization_denied_total").increment(1);
}

// ============================================================================
// League Metrics
// ============================================================================

/// Increment channels created counter.
pub fn channels_created_total() {
    metrics::counter!("channels_created_total").increment(1);
}

/// Increment tournaments created counter.
pub fn tournaments_created_total() {
    metrics::counter!("tournaments_created_total").increment(1);
}

/// Add to the matches created counter, labelled by creation path.
pub fn matches_created_total(count: usize, bulk: bool) {
    metrics::counter!("matches_created_total",
        "bulk" => bulk.to_string()
    )
    .increment(count as u64);
}

/// Increment matches completed counter.
pub fn matches_completed_total() {
    metrics::counter!("matches_completed_total").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_label_collapses_ids() {
        assert_eq!(
            route_label("/api/v1/matches/42/games"),
            "/api/v1/matches/{id}/games"
        );
        assert_eq!(
            route_label("/api/v1/tournaments/stats/channel/7"),
            "/api/v1/tournaments/stats/channel/{id}"
        );
        assert_eq!(route_label("/health"), "/health");
        assert_eq!(route_label("/api/v1/users/me"), "/api/v1/users/me");
    }

    #[test]
    fn test_recording_without_exporter_is_noop() {
        http_requests_total("GET", "/health", 200);
        http_request_duration_ms("GET", "/health", 1.5);
        matches_created_total(3, true);
    }
}

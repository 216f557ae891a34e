//! Structured logging configuration.
//!
//! The domain library logs through the `log` facade; the subscriber installed
//! here also receives those records, so one `RUST_LOG` filter governs both.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels come from `RUST_LOG`, defaulting to `info,sqlx=warn,hyper=warn`.
///
/// # Example
///
/// ```no_run
/// use leaguelink_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log security event with structured data
///
/// # Example
///
/// ```
/// use leaguelink_server::logging::log_security_event;
///
/// log_security_event(
///     "failed_login",
///     None,
///     Some("/api/v1/auth/login"),
///     "Invalid credentials for 'alice'"
/// );
/// ```
pub fn log_security_event(event_type: &str, user_id: Option<i64>, path: Option<&str>, message: &str) {
    tracing::warn!(
        event_type = event_type,
        user_id = user_id,
        path = path,
        "SECURITY: {}",
        message
    );
}

/// Log API request/response
pub fn log_api_request(method: &str, path: &str, status_code: u16, duration_ms: u64) {
    if duration_ms > 1000 {
        tracing::warn!(
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "PERFORMANCE: Slow request"
        );
    } else {
        tracing::info!(
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "API request completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_security_event() {
        // Just ensure it doesn't panic
        log_security_event("forbidden", Some(1), Some("/api/v1/matches/3"), "Test message");
        log_security_event("failed_login", None, None, "Test message");
    }

    #[test]
    fn test_log_api_request() {
        log_api_request("GET", "/api/v1/channels", 200, 45);
        log_api_request("POST", "/api/v1/tournaments/{id}/bulk", 201, 1500);
    }
}

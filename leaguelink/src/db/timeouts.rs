//! Database query timeout helpers
//!
//! Bounds every PostgreSQL round trip so a stalled connection surfaces as
//! `StoreError::Timeout` instead of hanging a request.

use super::errors::{StoreError, StoreResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

/// Default timeout for single-row queries (5 seconds)
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for statements touching many rows (30 seconds)
pub const LONG_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Execute a query with timeout
///
/// # Example
///
/// ```no_run
/// use leaguelink::db::timeouts::{with_timeout, DEFAULT_QUERY_TIMEOUT};
/// # use sqlx::PgPool;
/// # async fn example(pool: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
///
/// let row = with_timeout(
///     DEFAULT_QUERY_TIMEOUT,
///     sqlx::query("SELECT id FROM channels WHERE id = $1")
///         .bind(1_i64)
///         .fetch_optional(pool),
/// )
/// .await?;
///
/// # Ok(())
/// # }
/// ```
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> StoreResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match timeout(duration, future).await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => Err(StoreError::from_sqlx(e)),
        Err(_) => Err(StoreError::Timeout(duration)),
    }
}

/// Execute a query with the default timeout
pub async fn with_default_timeout<F, T>(future: F) -> StoreResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    with_timeout(DEFAULT_QUERY_TIMEOUT, future).await
}

/// Execute a bulk statement with the extended timeout
pub async fn with_long_timeout<F, T>(future: F) -> StoreResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    with_timeout(LONG_OPERATION_TIMEOUT, future).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_slow_future_times_out() {
        let result: StoreResult<()> = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(StoreError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_query_error_passes_through() {
        let result: StoreResult<()> =
            with_default_timeout(async { Err(sqlx::Error::RowNotFound) }).await;
        assert!(matches!(result, Err(StoreError::Database(_))));
    }

    #[test]
    fn test_timeout_error_display() {
        let err = StoreError::Timeout(Duration::from_secs(5));
        assert!(err.to_string().contains("timed out"));
        assert!(err.to_string().contains("5s"));
    }
}

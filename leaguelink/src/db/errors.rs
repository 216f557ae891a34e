//! Persistence error types.

use std::time::Duration;
use thiserror::Error;

/// Errors raised by repository implementations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored value does not fit the domain type
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// Query did not finish in time
    #[error("Database operation timed out after {0:?}")]
    Timeout(Duration),

    /// Unique constraint violated
    #[error("Duplicate value for {0}")]
    Duplicate(&'static str),
}

/// Result type for repository operations
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Classify a driver error, turning known unique constraints into
    /// `Duplicate`
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return match db_err.constraint() {
                    Some("users_email_key") => StoreError::Duplicate("email"),
                    Some("users_username_key") => StoreError::Duplicate("username"),
                    _ => StoreError::Duplicate("record"),
                };
            }
        }
        StoreError::Database(err)
    }
}

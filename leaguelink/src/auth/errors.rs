//! Authentication error types.

use crate::db::StoreError;
use crate::error::ErrorKind;
use thiserror::Error;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Persistence error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// Username or password wrong
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// User not found
    #[error("User not found")]
    UserNotFound,

    /// Username already exists
    #[error("Username already exists")]
    UsernameTaken,

    /// Email already exists
    #[error("Email already exists")]
    EmailTaken,

    /// Invalid username format
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    /// Invalid email format
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Password too weak
    #[error("Password too weak: {0}")]
    WeakPassword(String),

    /// JWT token error
    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    /// Error category used to choose a response status
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Store(StoreError::Duplicate(_))
            | AuthError::UsernameTaken
            | AuthError::EmailTaken
            | AuthError::InvalidUsername(_)
            | AuthError::InvalidEmail(_)
            | AuthError::WeakPassword(_) => ErrorKind::Validation,
            AuthError::InvalidCredentials | AuthError::JwtError(_) => ErrorKind::Unauthorized,
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::Store(_) | AuthError::HashingFailed => ErrorKind::Internal,
        }
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    pub fn client_message(&self) -> String {
        match self {
            AuthError::Store(StoreError::Duplicate(field)) => format!("{field} already exists"),
            AuthError::Store(_) | AuthError::HashingFailed => "Internal server error".to_string(),
            AuthError::JwtError(_) => "Authentication failed".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

//! Channel error types.

use super::models::ChannelId;
use crate::auth::UserId;
use crate::db::StoreError;
use crate::error::ErrorKind;
use thiserror::Error;

/// Channel errors
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel not found: {0}")]
    NotFound(ChannelId),

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Invalid channel: {0}")]
    Invalid(String),

    #[error("User is already a member of this channel")]
    AlreadyMember,

    #[error("User is not a member of this channel")]
    NotMember,

    #[error("Private channels can only be joined by invitation")]
    PrivateChannel,

    #[error("The channel owner cannot leave the channel")]
    OwnerCannotLeave,

    #[error("Not permitted to {0}")]
    Forbidden(&'static str),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ChannelError {
    /// Error category used to choose a response status
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChannelError::NotFound(_) | ChannelError::UserNotFound(_) => ErrorKind::NotFound,
            ChannelError::Forbidden(_) | ChannelError::PrivateChannel => ErrorKind::Forbidden,
            ChannelError::Store(_) => ErrorKind::Internal,
            _ => ErrorKind::Validation,
        }
    }

    /// Get a client-safe error message
    pub fn client_message(&self) -> String {
        match self {
            ChannelError::Store(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

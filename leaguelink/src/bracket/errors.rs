//! Match error types.

use super::models::{MatchId, TeamSide};
use crate::channel::ChannelId;
use crate::db::StoreError;
use crate::error::ErrorKind;
use crate::tournament::TournamentId;
use thiserror::Error;

/// Match lifecycle errors
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Match not found: {0}")]
    NotFound(MatchId),

    #[error("Tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    #[error("Channel not found: {0}")]
    ChannelNotFound(ChannelId),

    #[error("best_of must be an odd number of at least 1, got {0}")]
    InvalidBestOf(u32),

    #[error("{0} must have at least one player")]
    EmptyTeam(TeamSide),

    #[error("Invalid match: {0}")]
    Invalid(String),

    #[error("Score {team1}-{team2} is impossible in a best of {best_of}")]
    ScoreOutOfRange {
        team1: u32,
        team2: u32,
        best_of: u32,
    },

    #[error("Match {0} is already completed")]
    AlreadyCompleted(MatchId),

    #[error("Game {0} has already been recorded")]
    DuplicateGame(u32),

    #[error("Next match {0} does not exist in this tournament")]
    InvalidNextMatch(MatchId),

    #[error("Match spec {index} is missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },

    #[error("Temporary id '{0}' is used more than once")]
    DuplicateTempId(String),

    #[error("next_match_id '{0}' does not name a match in this batch")]
    UnknownTempId(String),

    #[error("Match stats must be a JSON object")]
    StatsNotObject,

    #[error("Not permitted to {0}")]
    Forbidden(&'static str),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl MatchError {
    /// Error category used to choose a response status
    pub fn kind(&self) -> ErrorKind {
        match self {
            MatchError::NotFound(_)
            | MatchError::TournamentNotFound(_)
            | MatchError::ChannelNotFound(_) => ErrorKind::NotFound,
            MatchError::Forbidden(_) => ErrorKind::Forbidden,
            MatchError::Store(_) => ErrorKind::Internal,
            _ => ErrorKind::Validation,
        }
    }

    /// Get a client-safe error message
    pub fn client_message(&self) -> String {
        match self {
            MatchError::Store(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for match operations
pub type MatchResult<T> = Result<T, MatchError>;

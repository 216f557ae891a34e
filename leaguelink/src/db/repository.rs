//! Repository trait definitions for testability and dependency injection.
//!
//! Each trait treats its entity as a whole document: `insert_*` stores a new
//! document and returns it with the store-assigned id, `save_*` overwrites the
//! stored document with the given one. Concurrent saves of the same document
//! are last-writer-wins.
//!
//! Id lists that other documents hang off (a channel's `tournaments`, a
//! tournament's `matches`) are left alone by `save_*` and only change through
//! the append/remove operations, which update the stored list in one step.
//! A save from a stale read therefore cannot drop a tournament or match
//! created in the meantime, and appending a match cannot undo a join.

use async_trait::async_trait;

use super::errors::StoreResult;
use crate::auth::{NewUser, ProfileUpdate, User, UserId};
use crate::bracket::{Match, MatchId};
use crate::channel::{Channel, ChannelId};
use crate::tournament::{Tournament, TournamentId};

/// Trait for user repository operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user; `StoreError::Duplicate` on a taken username or email
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    /// Find a user together with their password hash
    async fn find_credentials(&self, username: &str) -> StoreResult<Option<(User, String)>>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: UserId) -> StoreResult<Option<User>>;

    /// Apply a profile update, returning the updated user
    async fn update_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> StoreResult<Option<User>>;
}

/// Trait for channel repository operations
#[async_trait]
pub trait ChannelRepository: Send + Sync {
    async fn insert_channel(&self, channel: Channel) -> StoreResult<Channel>;

    async fn find_channel(&self, channel_id: ChannelId) -> StoreResult<Option<Channel>>;

    /// All channels ordered by id
    async fn list_channels(&self) -> StoreResult<Vec<Channel>>;

    /// Overwrite everything except the `tournaments` list
    async fn save_channel(&self, channel: &Channel) -> StoreResult<()>;

    async fn append_channel_tournament(
        &self,
        channel_id: ChannelId,
        tournament_id: TournamentId,
    ) -> StoreResult<()>;

    async fn remove_channel_tournament(
        &self,
        channel_id: ChannelId,
        tournament_id: TournamentId,
    ) -> StoreResult<()>;

    /// Returns whether a channel was deleted
    async fn delete_channel(&self, channel_id: ChannelId) -> StoreResult<bool>;
}

/// Trait for tournament repository operations
#[async_trait]
pub trait TournamentRepository: Send + Sync {
    async fn insert_tournament(&self, tournament: Tournament) -> StoreResult<Tournament>;

    async fn find_tournament(&self, tournament_id: TournamentId)
    -> StoreResult<Option<Tournament>>;

    /// Tournaments of a channel ordered by id
    async fn list_by_channel(&self, channel_id: ChannelId) -> StoreResult<Vec<Tournament>>;

    /// Overwrite everything except the `matches` list
    async fn save_tournament(&self, tournament: &Tournament) -> StoreResult<()>;

    async fn append_tournament_matches(
        &self,
        tournament_id: TournamentId,
        match_ids: &[MatchId],
    ) -> StoreResult<()>;

    async fn remove_tournament_match(
        &self,
        tournament_id: TournamentId,
        match_id: MatchId,
    ) -> StoreResult<()>;

    async fn delete_tournament(&self, tournament_id: TournamentId) -> StoreResult<bool>;
}

/// Trait for match repository operations
#[async_trait]
pub trait MatchRepository: Send + Sync {
    async fn insert_match(&self, game: Match) -> StoreResult<Match>;

    async fn find_match(&self, match_id: MatchId) -> StoreResult<Option<Match>>;

    /// Matches of a tournament ordered by round, then match number
    async fn list_by_tournament(&self, tournament_id: TournamentId) -> StoreResult<Vec<Match>>;

    async fn save_match(&self, game: &Match) -> StoreResult<()>;

    async fn delete_match(&self, match_id: MatchId) -> StoreResult<bool>;

    /// Set `next_match` to null on every match pointing at `target`,
    /// returning how many were cleared
    async fn clear_next_match(&self, target: MatchId) -> StoreResult<u64>;

    /// Delete every match of a tournament, returning how many were removed
    async fn delete_by_tournament(&self, tournament_id: TournamentId) -> StoreResult<u64>;
}

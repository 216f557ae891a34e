//! Tournament manager for creating tournaments, managing participants and
//! computing channel standings.

use super::models::{
    CreateTournamentRequest, Participant, Tournament, TournamentId, TournamentStatus,
};
use super::stats::{UserStats, compute_user_stats};
use crate::auth::UserId;
use crate::channel::{Channel, ChannelId};
use crate::db::{
    ChannelRepository, MatchRepository, Repositories, StoreError, TournamentRepository,
};
use crate::error::ErrorKind;
use crate::policy::{self, Action, Resource};
use std::sync::Arc;
use thiserror::Error;

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Tournament not found: {0}")]
    NotFound(TournamentId),

    #[error("Channel not found: {0}")]
    ChannelNotFound(ChannelId),

    #[error("Tournament is full")]
    TournamentFull,

    #[error("Tournament already started")]
    AlreadyStarted,

    #[error("Player already registered")]
    AlreadyRegistered,

    #[error("User {0} is not a participant")]
    NotParticipant(UserId),

    #[error("Tournament cannot move from {actual} to {expected}")]
    InvalidState {
        expected: TournamentStatus,
        actual: TournamentStatus,
    },

    #[error("Invalid tournament: {0}")]
    Invalid(String),

    #[error("Not permitted to {0}")]
    Forbidden(&'static str),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl TournamentError {
    /// Error category used to choose a response status
    pub fn kind(&self) -> ErrorKind {
        match self {
            TournamentError::NotFound(_) | TournamentError::ChannelNotFound(_) => {
                ErrorKind::NotFound
            }
            TournamentError::Forbidden(_) => ErrorKind::Forbidden,
            TournamentError::Store(_) => ErrorKind::Internal,
            _ => ErrorKind::Validation,
        }
    }

    /// Get a client-safe error message
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::Store(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

pub type TournamentResult<T> = Result<T, TournamentError>;

/// Tournament manager
#[derive(Clone)]
pub struct TournamentManager {
    channels: Arc<dyn ChannelRepository>,
    tournaments: Arc<dyn TournamentRepository>,
    matches: Arc<dyn MatchRepository>,
}

impl TournamentManager {
    /// Create a new tournament manager
    pub fn new(repos: &Repositories) -> Self {
        Self {
            channels: repos.channels.clone(),
            tournaments: repos.tournaments.clone(),
            matches: repos.matches.clone(),
        }
    }

    /// Create a tournament in a channel; the actor must be a channel admin
    /// and becomes the organizer
    pub async fn create_tournament(
        &self,
        actor: UserId,
        request: CreateTournamentRequest,
    ) -> TournamentResult<Tournament> {
        let channel = self.load_channel(request.channel_id).await?;
        if !policy::is_permitted(actor, Action::CreateTournament, Resource::Channel(&channel)) {
            return Err(TournamentError::Forbidden("create tournaments in this channel"));
        }

        let tournament = self
            .tournaments
            .insert_tournament(Tournament::new(actor, request)?)
            .await?;

        self.channels
            .append_channel_tournament(channel.id, tournament.id)
            .await?;

        log::info!(
            "Created tournament {} '{}' in channel {}",
            tournament.id,
            tournament.name,
            channel.id
        );
        Ok(tournament)
    }

    /// Get a tournament the viewer is allowed to see
    pub async fn get_tournament(
        &self,
        viewer: UserId,
        tournament_id: TournamentId,
    ) -> TournamentResult<Tournament> {
        let tournament = self.load(tournament_id).await?;
        let channel = self.load_channel(tournament.channel_id).await?;
        ensure_visible(viewer, &channel)?;
        Ok(tournament)
    }

    /// List the tournaments of a channel in channel order
    pub async fn list_by_channel(
        &self,
        viewer: UserId,
        channel_id: ChannelId,
    ) -> TournamentResult<Vec<Tournament>> {
        let channel = self.load_channel(channel_id).await?;
        ensure_visible(viewer, &channel)?;
        self.channel_tournaments(&channel).await
    }

    /// Register a user as a participant
    ///
    /// # Errors
    ///
    /// * `TournamentError::AlreadyStarted` - Tournament is no longer pending
    /// * `TournamentError::AlreadyRegistered` - User already a participant
    /// * `TournamentError::TournamentFull` - No free slot left
    /// * `TournamentError::Forbidden` - Private channel and user not a member
    pub async fn join_tournament(
        &self,
        tournament_id: TournamentId,
        user_id: UserId,
        username: String,
    ) -> TournamentResult<Tournament> {
        let mut tournament = self.load(tournament_id).await?;
        let channel = self.load_channel(tournament.channel_id).await?;

        let resource = Resource::Tournament {
            tournament: &tournament,
            channel: &channel,
        };
        if !policy::is_permitted(user_id, Action::JoinTournament, resource) {
            return Err(TournamentError::Forbidden("join tournaments in this channel"));
        }

        tournament.add_participant(Participant::user(user_id, username))?;
        self.tournaments.save_tournament(&tournament).await?;

        log::info!("User {} joined tournament {}", user_id, tournament_id);
        Ok(tournament)
    }

    /// Add a guest (no account) participant
    pub async fn add_guest(
        &self,
        actor: UserId,
        tournament_id: TournamentId,
        name: String,
    ) -> TournamentResult<Tournament> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(TournamentError::Invalid("guest name is required".to_string()));
        }

        let (mut tournament, _) = self.authorize(actor, tournament_id).await?;
        tournament.add_participant(Participant::guest(name))?;
        self.tournaments.save_tournament(&tournament).await?;
        Ok(tournament)
    }

    /// Withdraw a user while the tournament is still pending
    pub async fn leave_tournament(
        &self,
        tournament_id: TournamentId,
        user_id: UserId,
    ) -> TournamentResult<Tournament> {
        let mut tournament = self.load(tournament_id).await?;

        if tournament.status != TournamentStatus::Pending {
            return Err(TournamentError::AlreadyStarted);
        }
        if !tournament.has_participant(user_id) {
            return Err(TournamentError::NotParticipant(user_id));
        }

        tournament
            .participants
            .retain(|p| p.user_id != Some(user_id));
        self.tournaments.save_tournament(&tournament).await?;
        Ok(tournament)
    }

    /// Move a tournament forward; a winner may be named on completion
    pub async fn update_status(
        &self,
        actor: UserId,
        tournament_id: TournamentId,
        status: TournamentStatus,
        winner: Option<UserId>,
    ) -> TournamentResult<Tournament> {
        let (mut tournament, _) = self.authorize(actor, tournament_id).await?;

        tournament.transition(status, winner)?;
        self.tournaments.save_tournament(&tournament).await?;

        log::info!("Tournament {} is now {}", tournament_id, status);
        Ok(tournament)
    }

    /// Delete a tournament with all of its matches
    pub async fn delete_tournament(
        &self,
        actor: UserId,
        tournament_id: TournamentId,
    ) -> TournamentResult<()> {
        let (_, channel) = self.authorize(actor, tournament_id).await?;

        let removed = self.matches.delete_by_tournament(tournament_id).await?;
        self.tournaments.delete_tournament(tournament_id).await?;

        self.channels
            .remove_channel_tournament(channel.id, tournament_id)
            .await?;

        log::info!(
            "Deleted tournament {} and {} matches",
            tournament_id,
            removed
        );
        Ok(())
    }

    /// Win/loss record of every user across the channel's tournaments
    pub async fn compute_channel_user_stats(
        &self,
        viewer: UserId,
        channel_id: ChannelId,
    ) -> TournamentResult<Vec<UserStats>> {
        let channel = self.load_channel(channel_id).await?;
        ensure_visible(viewer, &channel)?;

        let tournaments = self.channel_tournaments(&channel).await?;
        Ok(compute_user_stats(&tournaments))
    }

    async fn channel_tournaments(&self, channel: &Channel) -> TournamentResult<Vec<Tournament>> {
        let mut tournaments = self.tournaments.list_by_channel(channel.id).await?;
        let rank = |id: TournamentId| {
            channel
                .tournaments
                .iter()
                .position(|t| *t == id)
                .unwrap_or(usize::MAX)
        };
        tournaments.sort_by_key(|t| (rank(t.id), t.id));
        Ok(tournaments)
    }

    async fn load(&self, tournament_id: TournamentId) -> TournamentResult<Tournament> {
        self.tournaments
            .find_tournament(tournament_id)
            .await?
            .ok_or(TournamentError::NotFound(tournament_id))
    }

    async fn load_channel(&self, channel_id: ChannelId) -> TournamentResult<Channel> {
        self.channels
            .find_channel(channel_id)
            .await?
            .ok_or(TournamentError::ChannelNotFound(channel_id))
    }

    /// Load a tournament and its channel, requiring organizer or admin
    async fn authorize(
        &self,
        actor: UserId,
        tournament_id: TournamentId,
    ) -> TournamentResult<(Tournament, Channel)> {
        let tournament = self.load(tournament_id).await?;
        let channel = self.load_channel(tournament.channel_id).await?;

        let resource = Resource::Tournament {
            tournament: &tournament,
            channel: &channel,
        };
        if !policy::is_permitted(actor, Action::ManageTournament, resource) {
            log::warn!(
                "User {} denied management of tournament {}",
                actor,
                tournament_id
            );
            return Err(TournamentError::Forbidden("manage this tournament"));
        }
        Ok((tournament, channel))
    }
}

fn ensure_visible(viewer: UserId, channel: &Channel) -> TournamentResult<()> {
    if policy::is_permitted(viewer, Action::ViewChannel, Resource::Channel(channel)) {
        Ok(())
    } else {
        Err(TournamentError::Forbidden("view this channel"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::CreateChannelRequest;
    use crate::tournament::TournamentFormat;
    use chrono::Utc;

    const OWNER: UserId = 1;
    const PLAYER: UserId = 2;
    const OTHER: UserId = 3;

    async fn setup(is_private: bool) -> (TournamentManager, Repositories, ChannelId) {
        let repos = Repositories::in_memory();
        let channel = repos
            .channels
            .insert_channel(
                Channel::new(
                    OWNER,
                    CreateChannelRequest {
                        name: "Chess Club".to_string(),
                        is_private,
                        ..Default::default()
                    },
                )
                .unwrap(),
            )
            .await
            .unwrap();
        (TournamentManager::new(&repos), repos, channel.id)
    }

    fn request(channel_id: ChannelId, max_participants: u32) -> CreateTournamentRequest {
        CreateTournamentRequest {
            channel_id,
            name: "Blitz Night".to_string(),
            description: String::new(),
            format: TournamentFormat::RoundRobin,
            start_date: Utc::now(),
            max_participants,
        }
    }

    #[tokio::test]
    async fn test_create_requires_admin() {
        let (manager, repos, channel_id) = setup(false).await;

        let err = manager
            .create_tournament(PLAYER, request(channel_id, 4))
            .await
            .unwrap_err();
        assert!(matches!(err, TournamentError::Forbidden(_)));

        let tournament = manager
            .create_tournament(OWNER, request(channel_id, 4))
            .await
            .unwrap();
        let channel = repos.channels.find_channel(channel_id).await.unwrap().unwrap();
        assert_eq!(channel.tournaments, vec![tournament.id]);
        assert_eq!(tournament.organizer, OWNER);
    }

    #[tokio::test]
    async fn test_join_full_tournament() {
        let (manager, _, channel_id) = setup(false).await;
        let tournament = manager
            .create_tournament(OWNER, request(channel_id, 2))
            .await
            .unwrap();

        manager
            .join_tournament(tournament.id, PLAYER, "player".into())
            .await
            .unwrap();
        assert!(matches!(
            manager
                .join_tournament(tournament.id, PLAYER, "player".into())
                .await,
            Err(TournamentError::AlreadyRegistered)
        ));
        manager
            .join_tournament(tournament.id, OTHER, "other".into())
            .await
            .unwrap();
        let err = manager
            .join_tournament(tournament.id, 4, "late".into())
            .await
            .unwrap_err();
        assert!(matches!(err, TournamentError::TournamentFull));
    }

    #[tokio::test]
    async fn test_private_channel_join_requires_membership() {
        let (manager, _, channel_id) = setup(true).await;
        let tournament = manager
            .create_tournament(OWNER, request(channel_id, 8))
            .await
            .unwrap();

        let err = manager
            .join_tournament(tournament.id, PLAYER, "player".into())
            .await
            .unwrap_err();
        assert!(matches!(err, TournamentError::Forbidden(_)));
        assert!(manager.get_tournament(PLAYER, tournament.id).await.is_err());
    }

    #[tokio::test]
    async fn test_leave_only_while_pending() {
        let (manager, _, channel_id) = setup(false).await;
        let tournament = manager
            .create_tournament(OWNER, request(channel_id, 8))
            .await
            .unwrap();
        manager
            .join_tournament(tournament.id, PLAYER, "player".into())
            .await
            .unwrap();

        assert!(matches!(
            manager.leave_tournament(tournament.id, OTHER).await,
            Err(TournamentError::NotParticipant(OTHER))
        ));
        let left = manager.leave_tournament(tournament.id, PLAYER).await.unwrap();
        assert!(left.participants.is_empty());

        manager
            .join_tournament(tournament.id, PLAYER, "player".into())
            .await
            .unwrap();
        manager
            .update_status(OWNER, tournament.id, TournamentStatus::Active, None)
            .await
            .unwrap();
        assert!(matches!(
            manager.leave_tournament(tournament.id, PLAYER).await,
            Err(TournamentError::AlreadyStarted)
        ));
    }

    #[tokio::test]
    async fn test_guest_added_by_organizer() {
        let (manager, _, channel_id) = setup(false).await;
        let tournament = manager
            .create_tournament(OWNER, request(channel_id, 8))
            .await
            .unwrap();

        assert!(matches!(
            manager.add_guest(PLAYER, tournament.id, "Sam".into()).await,
            Err(TournamentError::Forbidden(_))
        ));
        let updated = manager
            .add_guest(OWNER, tournament.id, "  Sam ".into())
            .await
            .unwrap();
        assert_eq!(updated.participants.len(), 1);
        assert!(updated.participants[0].is_guest);
        assert_eq!(updated.participants[0].username, "Sam");
    }

    #[tokio::test]
    async fn test_channel_stats() {
        let (manager, _, channel_id) = setup(false).await;

        for winner in [PLAYER, PLAYER, OTHER] {
            let tournament = manager
                .create_tournament(OWNER, request(channel_id, 4))
                .await
                .unwrap();
            manager
                .join_tournament(tournament.id, PLAYER, "player".into())
                .await
                .unwrap();
            manager
                .join_tournament(tournament.id, OTHER, "other".into())
                .await
                .unwrap();
            manager
                .update_status(
                    OWNER,
                    tournament.id,
                    TournamentStatus::Completed,
                    Some(winner),
                )
                .await
                .unwrap();
        }

        let stats = manager
            .compute_channel_user_stats(OWNER, channel_id)
            .await
            .unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].user_id, PLAYER);
        assert_eq!(stats[0].wins, 2);
        assert_eq!(stats[0].losses, 1);
        assert_eq!(stats[1].user_id, OTHER);
        assert_eq!(stats[1].total_tournaments, 3);
    }

    #[tokio::test]
    async fn test_delete_removes_matches_and_channel_entry() {
        use crate::bracket::{CreateMatchRequest, MatchManager, Player};

        let (manager, repos, channel_id) = setup(false).await;
        let tournament = manager
            .create_tournament(OWNER, request(channel_id, 4))
            .await
            .unwrap();
        let game = MatchManager::new(&repos)
            .create_match(
                OWNER,
                CreateMatchRequest {
                    tournament_id: tournament.id,
                    round: 1,
                    match_number: 1,
                    position: None,
                    best_of: 1,
                    team1: vec![Player::new("A")],
                    team2: vec![Player::new("B")],
                    next_match_id: None,
                },
            )
            .await
            .unwrap();

        manager.delete_tournament(OWNER, tournament.id).await.unwrap();

        assert!(repos.matches.find_match(game.id).await.unwrap().is_none());
        let channel = repos.channels.find_channel(channel_id).await.unwrap().unwrap();
        assert!(channel.tournaments.is_empty());
        assert!(matches!(
            manager.get_tournament(OWNER, tournament.id).await,
            Err(TournamentError::NotFound(_))
        ));
    }
}

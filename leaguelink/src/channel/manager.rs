//! Channel manager for membership and administration.

use super::errors::{ChannelError, ChannelResult};
use super::models::{Channel, ChannelId, ChannelUpdate, CreateChannelRequest};
use crate::auth::UserId;
use crate::db::{
    ChannelRepository, MatchRepository, Repositories, TournamentRepository, UserRepository,
};
use crate::policy::{self, Action, Resource};
use std::sync::Arc;

/// Channel manager
#[derive(Clone)]
pub struct ChannelManager {
    users: Arc<dyn UserRepository>,
    channels: Arc<dyn ChannelRepository>,
    tournaments: Arc<dyn TournamentRepository>,
    matches: Arc<dyn MatchRepository>,
}

impl ChannelManager {
    /// Create a new channel manager
    pub fn new(repos: &Repositories) -> Self {
        Self {
            users: repos.users.clone(),
            channels: repos.channels.clone(),
            tournaments: repos.tournaments.clone(),
            matches: repos.matches.clone(),
        }
    }

    /// Create a channel owned by `owner`
    pub async fn create_channel(
        &self,
        owner: UserId,
        request: CreateChannelRequest,
    ) -> ChannelResult<Channel> {
        let channel = self
            .channels
            .insert_channel(Channel::new(owner, request)?)
            .await?;

        log::info!(
            "User {} created channel {} '{}'",
            owner,
            channel.id,
            channel.name
        );
        Ok(channel)
    }

    /// Get a channel; private channels are only visible to members
    pub async fn get_channel(&self, viewer: UserId, channel_id: ChannelId) -> ChannelResult<Channel> {
        let channel = self.load(channel_id).await?;
        if !policy::is_permitted(viewer, Action::ViewChannel, Resource::Channel(&channel)) {
            return Err(ChannelError::Forbidden("view this channel"));
        }
        Ok(channel)
    }

    /// All channels visible to `viewer`
    pub async fn list_channels(&self, viewer: UserId) -> ChannelResult<Vec<Channel>> {
        let channels = self.channels.list_channels().await?;
        Ok(channels
            .into_iter()
            .filter(|c| policy::is_permitted(viewer, Action::ViewChannel, Resource::Channel(c)))
            .collect())
    }

    /// Edit channel details (admins only)
    pub async fn update_channel(
        &self,
        actor: UserId,
        channel_id: ChannelId,
        update: ChannelUpdate,
    ) -> ChannelResult<Channel> {
        let mut channel = self.authorize(actor, channel_id, Action::ManageChannel).await?;
        channel.apply(update)?;
        self.channels.save_channel(&channel).await?;
        Ok(channel)
    }

    /// Delete a channel together with its tournaments and their matches
    /// (owner only)
    pub async fn delete_channel(&self, actor: UserId, channel_id: ChannelId) -> ChannelResult<()> {
        let channel = self.authorize(actor, channel_id, Action::OwnChannel).await?;

        for tournament_id in &channel.tournaments {
            self.matches.delete_by_tournament(*tournament_id).await?;
            self.tournaments.delete_tournament(*tournament_id).await?;
        }
        self.channels.delete_channel(channel_id).await?;

        log::info!(
            "Deleted channel {} with {} tournaments",
            channel_id,
            channel.tournaments.len()
        );
        Ok(())
    }

    /// Join a public channel
    pub async fn join_channel(&self, user_id: UserId, channel_id: ChannelId) -> ChannelResult<Channel> {
        let mut channel = self.load(channel_id).await?;

        if channel.is_private {
            return Err(ChannelError::PrivateChannel);
        }
        if !channel.members.insert(user_id) {
            return Err(ChannelError::AlreadyMember);
        }

        self.channels.save_channel(&channel).await?;
        Ok(channel)
    }

    /// Leave a channel, giving up any admin role
    pub async fn leave_channel(&self, user_id: UserId, channel_id: ChannelId) -> ChannelResult<Channel> {
        let mut channel = self.load(channel_id).await?;

        if channel.is_owner(user_id) {
            return Err(ChannelError::OwnerCannotLeave);
        }
        if !channel.members.remove(&user_id) {
            return Err(ChannelError::NotMember);
        }
        channel.admins.remove(&user_id);

        self.channels.save_channel(&channel).await?;
        Ok(channel)
    }

    /// Add an existing user as a member (admins only); the way into a
    /// private channel
    pub async fn add_member(
        &self,
        actor: UserId,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> ChannelResult<Channel> {
        let mut channel = self.authorize(actor, channel_id, Action::ManageChannel).await?;

        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(ChannelError::UserNotFound(user_id));
        }
        if !channel.members.insert(user_id) {
            return Err(ChannelError::AlreadyMember);
        }

        self.channels.save_channel(&channel).await?;
        log::info!("User {} added {} to channel {}", actor, user_id, channel_id);
        Ok(channel)
    }

    /// Grant admin rights to a member (owner only)
    pub async fn promote_admin(
        &self,
        actor: UserId,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> ChannelResult<Channel> {
        let mut channel = self.authorize(actor, channel_id, Action::OwnChannel).await?;

        if !channel.is_member(user_id) {
            return Err(ChannelError::NotMember);
        }
        channel.admins.insert(user_id);

        self.channels.save_channel(&channel).await?;
        Ok(channel)
    }

    async fn load(&self, channel_id: ChannelId) -> ChannelResult<Channel> {
        self.channels
            .find_channel(channel_id)
            .await?
            .ok_or(ChannelError::NotFound(channel_id))
    }

    async fn authorize(
        &self,
        actor: UserId,
        channel_id: ChannelId,
        action: Action,
    ) -> ChannelResult<Channel> {
        let channel = self.load(channel_id).await?;
        if !policy::is_permitted(actor, action, Resource::Channel(&channel)) {
            log::warn!("User {} denied {:?} on channel {}", actor, action, channel_id);
            return Err(ChannelError::Forbidden(match action {
                Action::OwnChannel => "perform owner actions on this channel",
                _ => "manage this channel",
            }));
        }
        Ok(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::NewUser;

    async fn setup() -> (ChannelManager, Repositories, UserId, UserId) {
        let repos = Repositories::in_memory();
        let mut ids = Vec::new();
        for name in ["owner", "player"] {
            let user = repos
                .users
                .create_user(NewUser {
                    username: name.to_string(),
                    email: None,
                    display_name: name.to_string(),
                    password_hash: "hash".to_string(),
                })
                .await
                .unwrap();
            ids.push(user.id);
        }
        (ChannelManager::new(&repos), repos, ids[0], ids[1])
    }

    fn request(name: &str, is_private: bool) -> CreateChannelRequest {
        CreateChannelRequest {
            name: name.to_string(),
            is_private,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_join_and_leave_public_channel() {
        let (manager, _, owner, player) = setup().await;
        let channel = manager
            .create_channel(owner, request("Tennis Ladder", false))
            .await
            .unwrap();

        let joined = manager.join_channel(player, channel.id).await.unwrap();
        assert!(joined.is_member(player));
        assert!(matches!(
            manager.join_channel(player, channel.id).await,
            Err(ChannelError::AlreadyMember)
        ));

        let left = manager.leave_channel(player, channel.id).await.unwrap();
        assert!(!left.is_member(player));
        assert!(matches!(
            manager.leave_channel(owner, channel.id).await,
            Err(ChannelError::OwnerCannotLeave)
        ));
    }

    #[tokio::test]
    async fn test_private_channel_requires_invitation() {
        let (manager, _, owner, player) = setup().await;
        let channel = manager
            .create_channel(owner, request("Staff Only", true))
            .await
            .unwrap();

        assert!(matches!(
            manager.join_channel(player, channel.id).await,
            Err(ChannelError::PrivateChannel)
        ));
        assert!(manager.get_channel(player, channel.id).await.is_err());
        assert!(manager.list_channels(player).await.unwrap().is_empty());

        manager.add_member(owner, channel.id, player).await.unwrap();
        assert_eq!(manager.list_channels(player).await.unwrap().len(), 1);
        assert!(matches!(
            manager.add_member(owner, channel.id, 999).await,
            Err(ChannelError::UserNotFound(999))
        ));
    }

    #[tokio::test]
    async fn test_only_owner_promotes() {
        let (manager, _, owner, player) = setup().await;
        let channel = manager
            .create_channel(owner, request("Darts", false))
            .await
            .unwrap();

        assert!(matches!(
            manager.promote_admin(owner, channel.id, player).await,
            Err(ChannelError::NotMember)
        ));
        manager.join_channel(player, channel.id).await.unwrap();
        assert!(matches!(
            manager.promote_admin(player, channel.id, player).await,
            Err(ChannelError::Forbidden(_))
        ));

        let channel = manager.promote_admin(owner, channel.id, player).await.unwrap();
        assert!(channel.is_admin(player));

        let updated = manager
            .update_channel(
                player,
                channel.id,
                ChannelUpdate {
                    sport: Some("darts".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.sport, "darts");
        assert!(matches!(
            manager.delete_channel(player, channel.id).await,
            Err(ChannelError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_channel_removes_tournaments() {
        use crate::tournament::{CreateTournamentRequest, TournamentFormat, TournamentManager};

        let (manager, repos, owner, _) = setup().await;
        let channel = manager
            .create_channel(owner, request("Go Club", false))
            .await
            .unwrap();
        let tournament = TournamentManager::new(&repos)
            .create_tournament(
                owner,
                CreateTournamentRequest {
                    channel_id: channel.id,
                    name: "Winter Open".to_string(),
                    description: String::new(),
                    format: TournamentFormat::Swiss,
                    start_date: chrono::Utc::now(),
                    max_participants: 16,
                },
            )
            .await
            .unwrap();

        manager.delete_channel(owner, channel.id).await.unwrap();
        assert!(repos.channels.find_channel(channel.id).await.unwrap().is_none());
        assert!(
            repos
                .tournaments
                .find_tournament(tournament.id)
                .await
                .unwrap()
                .is_none()
        );
    }
}

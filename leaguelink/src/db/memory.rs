//! In-memory repository implementation.
//!
//! Backs every repository trait with maps guarded by a tokio `RwLock`. Used by
//! unit tests and by the server's `--in-memory` mode; nothing survives a
//! restart.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use super::errors::{StoreError, StoreResult};
use super::repository::{ChannelRepository, MatchRepository, TournamentRepository, UserRepository};
use crate::auth::{NewUser, ProfileUpdate, User, UserId};
use crate::bracket::{Match, MatchId};
use crate::channel::{Channel, ChannelId};
use crate::tournament::{Tournament, TournamentId};

struct StoredUser {
    user: User,
    password_hash: String,
}

/// Process-local store for all entities
pub struct MemoryStore {
    next_id: AtomicI64,
    users: RwLock<BTreeMap<UserId, StoredUser>>,
    channels: RwLock<BTreeMap<ChannelId, Channel>>,
    tournaments: RwLock<BTreeMap<TournamentId, Tournament>>,
    matches: RwLock<BTreeMap<MatchId, Match>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            users: RwLock::new(BTreeMap::new()),
            channels: RwLock::new(BTreeMap::new()),
            tournaments: RwLock::new(BTreeMap::new()),
            matches: RwLock::new(BTreeMap::new()),
        }
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Overwrite an existing entry; saving a deleted document is a no-op
fn overwrite<T: Clone>(map: &mut BTreeMap<i64, T>, id: i64, value: &T) {
    if let Some(slot) = map.get_mut(&id) {
        *slot = value.clone();
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;

        if users
            .values()
            .any(|stored| stored.user.username == new_user.username)
        {
            return Err(StoreError::Duplicate("username"));
        }
        if let Some(email) = &new_user.email {
            if users
                .values()
                .any(|stored| stored.user.email.as_deref() == Some(email.as_str()))
            {
                return Err(StoreError::Duplicate("email"));
            }
        }

        let user = User {
            id: self.allocate_id(),
            username: new_user.username,
            email: new_user.email,
            display_name: new_user.display_name,
            bio: None,
            avatar_url: None,
            created_at: Utc::now(),
        };
        users.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                password_hash: new_user.password_hash,
            },
        );
        Ok(user)
    }

    async fn find_credentials(&self, username: &str) -> StoreResult<Option<(User, String)>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|stored| stored.user.username == username)
            .map(|stored| (stored.user.clone(), stored.password_hash.clone())))
    }

    async fn find_by_id(&self, user_id: UserId) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&user_id).map(|stored| stored.user.clone()))
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> StoreResult<Option<User>> {
        let mut users = self.users.write().await;
        let Some(stored) = users.get_mut(&user_id) else {
            return Ok(None);
        };

        if let Some(display_name) = &update.display_name {
            stored.user.display_name = display_name.clone();
        }
        if let Some(bio) = &update.bio {
            stored.user.bio = Some(bio.clone());
        }
        if let Some(avatar_url) = &update.avatar_url {
            stored.user.avatar_url = Some(avatar_url.clone());
        }
        Ok(Some(stored.user.clone()))
    }
}

#[async_trait]
impl ChannelRepository for MemoryStore {
    async fn insert_channel(&self, mut channel: Channel) -> StoreResult<Channel> {
        channel.id = self.allocate_id();
        self.channels
            .write()
            .await
            .insert(channel.id, channel.clone());
        Ok(channel)
    }

    async fn find_channel(&self, channel_id: ChannelId) -> StoreResult<Option<Channel>> {
        Ok(self.channels.read().await.get(&channel_id).cloned())
    }

    async fn list_channels(&self) -> StoreResult<Vec<Channel>> {
        Ok(self.channels.read().await.values().cloned().collect())
    }

    async fn save_channel(&self, channel: &Channel) -> StoreResult<()> {
        let mut channels = self.channels.write().await;
        if let Some(stored) = channels.get_mut(&channel.id) {
            let tournaments = std::mem::take(&mut stored.tournaments);
            *stored = Channel {
                tournaments,
                ..channel.clone()
            };
        }
        Ok(())
    }

    async fn append_channel_tournament(
        &self,
        channel_id: ChannelId,
        tournament_id: TournamentId,
    ) -> StoreResult<()> {
        if let Some(channel) = self.channels.write().await.get_mut(&channel_id) {
            channel.tournaments.push(tournament_id);
        }
        Ok(())
    }

    async fn remove_channel_tournament(
        &self,
        channel_id: ChannelId,
        tournament_id: TournamentId,
    ) -> StoreResult<()> {
        if let Some(channel) = self.channels.write().await.get_mut(&channel_id) {
            channel.tournaments.retain(|id| *id != tournament_id);
        }
        Ok(())
    }

    async fn delete_channel(&self, channel_id: ChannelId) -> StoreResult<bool> {
        Ok(self.channels.write().await.remove(&channel_id).is_some())
    }
}

#[async_trait]
impl TournamentRepository for MemoryStore {
    async fn insert_tournament(&self, mut tournament: Tournament) -> StoreResult<Tournament> {
        tournament.id = self.allocate_id();
        self.tournaments
            .write()
            .await
            .insert(tournament.id, tournament.clone());
        Ok(tournament)
    }

    async fn find_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> StoreResult<Option<Tournament>> {
        Ok(self.tournaments.read().await.get(&tournament_id).cloned())
    }

    async fn list_by_channel(&self, channel_id: ChannelId) -> StoreResult<Vec<Tournament>> {
        Ok(self
            .tournaments
            .read()
            .await
            .values()
            .filter(|t| t.channel_id == channel_id)
            .cloned()
            .collect())
    }

    async fn save_tournament(&self, tournament: &Tournament) -> StoreResult<()> {
        let mut tournaments = self.tournaments.write().await;
        if let Some(stored) = tournaments.get_mut(&tournament.id) {
            let matches = std::mem::take(&mut stored.matches);
            *stored = Tournament {
                matches,
                ..tournament.clone()
            };
        }
        Ok(())
    }

    async fn append_tournament_matches(
        &self,
        tournament_id: TournamentId,
        match_ids: &[MatchId],
    ) -> StoreResult<()> {
        if let Some(tournament) = self.tournaments.write().await.get_mut(&tournament_id) {
            tournament.matches.extend_from_slice(match_ids);
        }
        Ok(())
    }

    async fn remove_tournament_match(
        &self,
        tournament_id: TournamentId,
        match_id: MatchId,
    ) -> StoreResult<()> {
        if let Some(tournament) = self.tournaments.write().await.get_mut(&tournament_id) {
            tournament.matches.retain(|id| *id != match_id);
        }
        Ok(())
    }

    async fn delete_tournament(&self, tournament_id: TournamentId) -> StoreResult<bool> {
        Ok(self
            .tournaments
            .write()
            .await
            .remove(&tournament_id)
            .is_some())
    }
}

#[async_trait]
impl MatchRepository for MemoryStore {
    async fn insert_match(&self, mut game: Match) -> StoreResult<Match> {
        game.id = self.allocate_id();
        self.matches.write().await.insert(game.id, game.clone());
        Ok(game)
    }

    async fn find_match(&self, match_id: MatchId) -> StoreResult<Option<Match>> {
        Ok(self.matches.read().await.get(&match_id).cloned())
    }

    async fn list_by_tournament(&self, tournament_id: TournamentId) -> StoreResult<Vec<Match>> {
        let mut matches: Vec<Match> = self
            .matches
            .read()
            .await
            .values()
            .filter(|m| m.tournament_id == tournament_id)
            .cloned()
            .collect();
        matches.sort_by_key(|m| (m.round, m.match_number, m.id));
        Ok(matches)
    }

    async fn save_match(&self, game: &Match) -> StoreResult<()> {
        overwrite(&mut *self.matches.write().await, game.id, game);
        Ok(())
    }

    async fn delete_match(&self, match_id: MatchId) -> StoreResult<bool> {
        Ok(self.matches.write().await.remove(&match_id).is_some())
    }

    async fn clear_next_match(&self, target: MatchId) -> StoreResult<u64> {
        let mut matches = self.matches.write().await;
        let now = Utc::now();
        let mut cleared = 0;
        for game in matches.values_mut() {
            if game.next_match == Some(target) {
                game.next_match = None;
                game.updated_at = now;
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    async fn delete_by_tournament(&self, tournament_id: TournamentId) -> StoreResult<u64> {
        let mut matches = self.matches.write().await;
        let before = matches.len();
        matches.retain(|_, m| m.tournament_id != tournament_id);
        Ok((before - matches.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: Option<&str>) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.map(str::to_string),
            display_name: username.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_unique_username_and_email() {
        let store = MemoryStore::new();
        store
            .create_user(new_user("alice", Some("alice@example.com")))
            .await
            .unwrap();

        assert!(matches!(
            store.create_user(new_user("alice", None)).await,
            Err(StoreError::Duplicate("username"))
        ));
        assert!(matches!(
            store
                .create_user(new_user("alice2", Some("alice@example.com")))
                .await,
            Err(StoreError::Duplicate("email"))
        ));
        // Several users may omit their email
        store.create_user(new_user("bob", None)).await.unwrap();
        store.create_user(new_user("carol", None)).await.unwrap();
    }

    #[tokio::test]
    async fn test_ids_are_unique_across_entities() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("dave", None)).await.unwrap();
        let channel = store
            .insert_channel(
                Channel::new(
                    user.id,
                    crate::channel::CreateChannelRequest {
                        name: "Bowls".to_string(),
                        ..Default::default()
                    },
                )
                .unwrap(),
            )
            .await
            .unwrap();
        assert_ne!(user.id, channel.id);
        assert_eq!(store.list_channels().await.unwrap(), vec![channel]);
    }

    #[tokio::test]
    async fn test_save_after_delete_is_noop() {
        let store = MemoryStore::new();
        let mut channel = store
            .insert_channel(
                Channel::new(
                    1,
                    crate::channel::CreateChannelRequest {
                        name: "Rowing".to_string(),
                        ..Default::default()
                    },
                )
                .unwrap(),
            )
            .await
            .unwrap();
        assert!(store.delete_channel(channel.id).await.unwrap());
        channel.name = "Rowing Club".to_string();
        store.save_channel(&channel).await.unwrap();
        assert!(store.find_channel(channel.id).await.unwrap().is_none());
        assert!(!store.delete_channel(channel.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_stale_saves_keep_id_lists() {
        let store = MemoryStore::new();
        let channel = store
            .insert_channel(
                Channel::new(
                    1,
                    crate::channel::CreateChannelRequest {
                        name: "Padel".to_string(),
                        ..Default::default()
                    },
                )
                .unwrap(),
            )
            .await
            .unwrap();
        let mut stale_channel = channel.clone();

        store.append_channel_tournament(channel.id, 40).await.unwrap();
        store.append_channel_tournament(channel.id, 41).await.unwrap();
        stale_channel.members.insert(2);
        store.save_channel(&stale_channel).await.unwrap();

        let stored = store.find_channel(channel.id).await.unwrap().unwrap();
        assert_eq!(stored.tournaments, vec![40, 41]);
        assert!(stored.members.contains(&2));

        store.remove_channel_tournament(channel.id, 40).await.unwrap();
        let stored = store.find_channel(channel.id).await.unwrap().unwrap();
        assert_eq!(stored.tournaments, vec![41]);
    }
}

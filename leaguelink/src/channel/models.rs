//! Channel data models.

use super::errors::{ChannelError, ChannelResult};
use crate::auth::UserId;
use crate::tournament::TournamentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Channel ID type
pub type ChannelId = i64;

const MAX_NAME_LEN: usize = 80;

/// A community channel grouping members and their tournaments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    pub description: String,
    pub sport: String,
    pub is_private: bool,
    pub owner: UserId,
    pub admins: BTreeSet<UserId>,
    pub members: BTreeSet<UserId>,
    /// Tournaments in creation order
    pub tournaments: Vec<TournamentId>,
    pub created_at: DateTime<Utc>,
}

/// Channel creation request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateChannelRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sport: String,
    #[serde(default)]
    pub is_private: bool,
}

/// Editable channel fields; `None` leaves the field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sport: Option<String>,
    pub is_private: Option<bool>,
}

impl Channel {
    /// Build an unsaved channel owned by `owner`.
    ///
    /// The owner starts out as both admin and member. The id is assigned by
    /// the store on insert.
    pub fn new(owner: UserId, request: CreateChannelRequest) -> ChannelResult<Self> {
        let name = validate_name(&request.name)?;

        Ok(Self {
            id: 0,
            name,
            description: request.description,
            sport: request.sport,
            is_private: request.is_private,
            owner,
            admins: BTreeSet::from([owner]),
            members: BTreeSet::from([owner]),
            tournaments: Vec::new(),
            created_at: Utc::now(),
        })
    }

    pub fn is_member(&self, user_id: UserId) -> bool {
        self.members.contains(&user_id)
    }

    pub fn is_admin(&self, user_id: UserId) -> bool {
        self.admins.contains(&user_id)
    }

    pub fn is_owner(&self, user_id: UserId) -> bool {
        self.owner == user_id
    }

    /// Apply an update in place
    pub fn apply(&mut self, update: ChannelUpdate) -> ChannelResult<()> {
        if let Some(name) = update.name {
            self.name = validate_name(&name)?;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(sport) = update.sport {
            self.sport = sport;
        }
        if let Some(is_private) = update.is_private {
            self.is_private = is_private;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> ChannelResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ChannelError::Invalid("name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ChannelError::Invalid(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_is_admin_and_member() {
        let channel = Channel::new(
            3,
            CreateChannelRequest {
                name: "  Sunday Five-a-side ".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(channel.name, "Sunday Five-a-side");
        assert!(channel.is_owner(3));
        assert!(channel.is_admin(3));
        assert!(channel.is_member(3));
        assert!(channel.tournaments.is_empty());
    }

    #[test]
    fn test_blank_name_rejected() {
        let err = Channel::new(1, CreateChannelRequest::default()).unwrap_err();
        assert!(matches!(err, ChannelError::Invalid(_)));
    }

    #[test]
    fn test_apply_update() {
        let mut channel = Channel::new(
            1,
            CreateChannelRequest {
                name: "Chess Club".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        channel
            .apply(ChannelUpdate {
                sport: Some("chess".to_string()),
                is_private: Some(true),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(channel.sport, "chess");
        assert!(channel.is_private);
        assert_eq!(channel.name, "Chess Club");
    }
}

//! Authorization policy.
//!
//! Every mutation in the domain managers asks [`is_permitted`] whether the
//! acting user may perform an [`Action`] on a [`Resource`]. The rules are
//! plain capability checks: channel admins manage everything inside their
//! channel, tournament organizers manage their own tournament, and the channel
//! owner alone can delete the channel or promote admins.

use crate::auth::UserId;
use crate::channel::Channel;
use crate::tournament::Tournament;

/// Something a user wants to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// See a channel and its tournaments
    ViewChannel,
    /// Edit channel details or add members
    ManageChannel,
    /// Delete the channel or promote admins
    OwnChannel,
    /// Create a tournament inside a channel
    CreateTournament,
    /// Enter a tournament as a participant
    JoinTournament,
    /// Edit, start, finish or delete a tournament
    ManageTournament,
    /// Create, score or delete the matches of a tournament
    ManageMatches,
}

/// The entity an action targets
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    Channel(&'a Channel),
    Tournament {
        tournament: &'a Tournament,
        channel: &'a Channel,
    },
}

/// `admins.contains(user)`
pub fn is_admin(channel: &Channel, user_id: UserId) -> bool {
    channel.is_admin(user_id)
}

/// `organizer == user`
pub fn is_organizer(tournament: &Tournament, user_id: UserId) -> bool {
    tournament.organizer == user_id
}

/// Decide whether `actor` may perform `action` on `resource`.
///
/// Tournament actions against a bare channel, and channel actions against a
/// tournament, are never permitted.
pub fn is_permitted(actor: UserId, action: Action, resource: Resource<'_>) -> bool {
    match (action, resource) {
        (Action::ViewChannel, Resource::Channel(channel)) => {
            !channel.is_private || channel.is_member(actor)
        }
        (Action::ManageChannel | Action::CreateTournament, Resource::Channel(channel)) => {
            is_admin(channel, actor)
        }
        (Action::OwnChannel, Resource::Channel(channel)) => channel.is_owner(actor),
        (Action::JoinTournament, Resource::Tournament { channel, .. }) => {
            !channel.is_private || channel.is_member(actor)
        }
        (
            Action::ManageTournament | Action::ManageMatches,
            Resource::Tournament {
                tournament,
                channel,
            },
        ) => is_organizer(tournament, actor) || is_admin(channel, actor),
        _ => false,
    }
}

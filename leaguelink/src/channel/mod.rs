//! Channels: communities that own members, admins and tournaments.
//!
//! The creator of a channel becomes its owner and first admin. Admins edit
//! the channel, add members and create tournaments; only the owner deletes
//! the channel or promotes other members to admin. Public channels can be
//! joined freely, private ones only through [`ChannelManager::add_member`].

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{ChannelError, ChannelResult};
pub use manager::ChannelManager;
pub use models::{Channel, ChannelId, ChannelUpdate, CreateChannelRequest};

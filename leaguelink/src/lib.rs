//! # LeagueLink
//!
//! Community tournament management: users gather in channels, channel admins
//! run tournaments, and tournaments are played out as brackets of best-of-N
//! matches.
//!
//! ## Domain
//!
//! - **Channel**: a community with one owner, a set of admins and a set of
//!   members. Public channels can be joined freely, private ones by invitation.
//! - **Tournament**: belongs to a channel, has an organizer, a bracket format,
//!   a capacity and a participant list (registered users or guests).
//! - **Match**: one bracket node. Two teams play up to `best_of` games; the
//!   match completes when a team reaches `ceil(best_of / 2)` wins, and the
//!   winning lineup advances into the linked `next_match`.
//!
//! ## Core Modules
//!
//! - [`auth`]: Registration, Argon2id password hashing and JWT access tokens
//! - [`channel`]: Channel membership and administration
//! - [`tournament`]: Tournaments, participants and per-user statistics
//! - [`bracket`]: Matches, score progression and bracket linkage
//! - [`policy`]: Who may do what to which channel or tournament
//! - [`db`]: Repository traits with PostgreSQL and in-memory backends
//!
//! ## Example
//!
//! ```
//! use leaguelink::bracket::{BestOf, derive_status, MatchStatus};
//!
//! let best_of = BestOf::new(3).unwrap();
//! assert_eq!(best_of.wins_needed(), 2);
//! assert_eq!(derive_status(best_of, 2, 0), MatchStatus::Completed);
//! assert_eq!(derive_status(best_of, 1, 1), MatchStatus::InProgress);
//! ```

/// Authentication and user profiles.
pub mod auth;

/// Matches and bracket progression.
pub mod bracket;

/// Channels and membership.
pub mod channel;

/// Persistence layer.
pub mod db;

/// Error categories shared across modules.
pub mod error;

/// Authorization rules.
pub mod policy;

/// Tournaments and statistics.
pub mod tournament;

pub use auth::{AuthManager, UserId};
pub use bracket::MatchManager;
pub use channel::ChannelManager;
pub use db::Repositories;
pub use error::ErrorKind;
pub use tournament::TournamentManager;

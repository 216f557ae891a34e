//! Bracket module: matches, scoring and winner advancement.
//!
//! Matches belong to a tournament and may link to the match their winner
//! advances into (`next_match`). Together those links form the bracket.
//!
//! ## Example
//!
//! ```no_run
//! use leaguelink::bracket::{MatchManager, TeamSide};
//! use leaguelink::db::Repositories;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repos = Repositories::in_memory();
//!     let matches = MatchManager::new(&repos);
//!
//!     // Organizer 1 records that team1 took game 1 of match 42
//!     let updated = matches.record_game_result(1, 42, 1, TeamSide::Team1).await?;
//!     println!("Match is now {}", updated.status.as_str());
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{MatchError, MatchResult};
pub use manager::{BulkMatchSpec, CreateMatchRequest, MatchManager};
pub use models::{
    BestOf, GameResult, Match, MatchDraft, MatchId, MatchStatus, PLACEHOLDER_NAME, Player, Team,
    TeamSide, derive_status,
};

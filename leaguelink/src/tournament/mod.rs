//! Tournament module for channel tournaments and their participants.
//!
//! This module provides:
//! - Tournament creation inside a channel (admins only)
//! - Participant registration with capacity limits, including guests
//! - Forward-only status progression with an optional winner
//! - Per-user win/loss statistics for a channel
//!
//! ## Example
//!
//! ```no_run
//! use leaguelink::db::Repositories;
//! use leaguelink::tournament::TournamentManager;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repos = Repositories::in_memory();
//!     let tournaments = TournamentManager::new(&repos);
//!
//!     let tournament = tournaments
//!         .join_tournament(7, 3, "keeper3".to_string())
//!         .await?;
//!     println!("{} participants", tournament.participants.len());
//!     Ok(())
//! }
//! ```

pub mod manager;
pub mod models;
pub mod stats;

pub use manager::{TournamentError, TournamentManager, TournamentResult};
pub use models::{
    CreateTournamentRequest, Participant, ParticipantStatus, Tournament, TournamentFormat,
    TournamentId, TournamentStatus,
};
pub use stats::{UserStats, compute_user_stats, win_rate};

//! HTTP server for LeagueLink.
//!
//! Exposes the channel, tournament and bracket managers of the `leaguelink`
//! crate as a JSON REST API under `/api/v1`.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;

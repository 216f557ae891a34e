//! Match and bracket API handlers.
//!
//! Reads go through the tournament's channel visibility; writes are checked
//! by the match manager against the tournament organizer and channel admins.
//!
//! Creating a two-match bracket in one call:
//!
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/tournaments/3/bulk \
//!   -H "Authorization: Bearer $TOKEN" \
//!   -H "Content-Type: application/json" \
//!   -d '{"matches": [
//!         {"temp_id": "final", "round": 2, "match_number": 1, "position": 1, "best_of": 3,
//!          "team1": [{"name": "TBD"}], "team2": [{"name": "TBD"}]},
//!         {"temp_id": "semi", "round": 1, "match_number": 1, "position": 1, "best_of": 3,
//!          "team1": [{"name": "Ana"}], "team2": [{"name": "Ben"}],
//!          "next_match_id": "final"}
//!       ]}'
//! ```

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use leaguelink::{
    UserId,
    bracket::{BulkMatchSpec, CreateMatchRequest, Match, MatchId, TeamSide},
    tournament::TournamentId,
};
use serde::Deserialize;
use serde_json::Value;

use super::{
    AppState,
    error::{ApiJson, ApiResult},
};
use crate::metrics;

/// Bulk bracket body
#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    pub matches: Vec<BulkMatchSpec>,
}

/// Score overwrite body
#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub team1_score: u32,
    pub team2_score: u32,
}

/// Single game result body
#[derive(Debug, Deserialize)]
pub struct GameRequest {
    pub game_number: u32,
    pub winner: TeamSide,
}

pub async fn create_match(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    ApiJson(request): ApiJson<CreateMatchRequest>,
) -> ApiResult<(StatusCode, Json<Match>)> {
    let game = state.match_manager.create_match(user_id, request).await?;
    metrics::matches_created_total(1, false);

    Ok((StatusCode::CREATED, Json(game)))
}

/// Create a whole bracket; `next_match_id` values name other entries' `temp_id`
pub async fn bulk_create_matches(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(tournament_id): Path<TournamentId>,
    ApiJson(request): ApiJson<BulkRequest>,
) -> ApiResult<(StatusCode, Json<Vec<Match>>)> {
    let created = state
        .match_manager
        .bulk_create_matches(user_id, tournament_id, request.matches)
        .await?;
    metrics::matches_created_total(created.len(), true);

    Ok((StatusCode::CREATED, Json(created)))
}

/// Matches of a tournament ordered by round and match number
pub async fn list_matches(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<Vec<Match>>> {
    state
        .tournament_manager
        .get_tournament(user_id, tournament_id)
        .await?;
    Ok(Json(state.match_manager.list_matches(tournament_id).await?))
}

pub async fn get_match(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(match_id): Path<MatchId>,
) -> ApiResult<Json<Match>> {
    let game = state.match_manager.get_match(match_id).await?;
    state
        .tournament_manager
        .get_tournament(user_id, game.tournament_id)
        .await?;
    Ok(Json(game))
}

/// Overwrite both scores; status and winner advancement follow from them
pub async fn set_score(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(match_id): Path<MatchId>,
    ApiJson(request): ApiJson<ScoreRequest>,
) -> ApiResult<Json<Match>> {
    let was_completed = state.match_manager.get_match(match_id).await?.is_completed();
    let game = state
        .match_manager
        .set_score(user_id, match_id, request.team1_score, request.team2_score)
        .await?;
    if game.is_completed() && !was_completed {
        metrics::matches_completed_total();
    }

    Ok(Json(game))
}

pub async fn record_game(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(match_id): Path<MatchId>,
    ApiJson(request): ApiJson<GameRequest>,
) -> ApiResult<Json<Match>> {
    let game = state
        .match_manager
        .record_game_result(user_id, match_id, request.game_number, request.winner)
        .await?;
    // Completed matches reject further games, so this is the completing one
    if game.is_completed() {
        metrics::matches_completed_total();
    }

    Ok(Json(game))
}

/// Merge a JSON object into the match stats
pub async fn update_stats(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(match_id): Path<MatchId>,
    ApiJson(stats): ApiJson<Value>,
) -> ApiResult<Json<Match>> {
    Ok(Json(
        state
            .match_manager
            .update_stats(user_id, match_id, stats)
            .await?,
    ))
}

/// Delete a match, unlinking every match that feeds into it
pub async fn delete_match(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(match_id): Path<MatchId>,
) -> ApiResult<StatusCode> {
    state.match_manager.delete_match(user_id, match_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

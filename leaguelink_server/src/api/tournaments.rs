//! Tournament API handlers.

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use leaguelink::{
    UserId,
    channel::ChannelId,
    tournament::{CreateTournamentRequest, Tournament, TournamentId, TournamentStatus, UserStats},
};
use serde::Deserialize;

use super::{
    AppState,
    error::{ApiJson, ApiResult},
};
use crate::metrics;

/// Guest participant body
#[derive(Debug, Deserialize)]
pub struct GuestRequest {
    pub name: String,
}

/// Status change body; `winner` is recorded alongside `completed`
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: TournamentStatus,
    #[serde(default)]
    pub winner: Option<UserId>,
}

/// Create a tournament in a channel the caller administers
pub async fn create_tournament(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    ApiJson(request): ApiJson<CreateTournamentRequest>,
) -> ApiResult<(StatusCode, Json<Tournament>)> {
    let tournament = state
        .tournament_manager
        .create_tournament(user_id, request)
        .await?;
    metrics::tournaments_created_total();

    Ok((StatusCode::CREATED, Json(tournament)))
}

pub async fn get_tournament(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<Tournament>> {
    Ok(Json(
        state
            .tournament_manager
            .get_tournament(user_id, tournament_id)
            .await?,
    ))
}

/// Tournaments of a channel in creation order
pub async fn list_by_channel(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(channel_id): Path<ChannelId>,
) -> ApiResult<Json<Vec<Tournament>>> {
    Ok(Json(
        state
            .tournament_manager
            .list_by_channel(user_id, channel_id)
            .await?,
    ))
}

/// Per-user wins, losses and win rate across a channel
pub async fn channel_stats(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(channel_id): Path<ChannelId>,
) -> ApiResult<Json<Vec<UserStats>>> {
    Ok(Json(
        state
            .tournament_manager
            .compute_channel_user_stats(user_id, channel_id)
            .await?,
    ))
}

/// Register the caller under their current username
pub async fn join_tournament(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<Tournament>> {
    let user = state.auth_manager.get_user(user_id).await?;
    Ok(Json(
        state
            .tournament_manager
            .join_tournament(tournament_id, user_id, user.username)
            .await?,
    ))
}

pub async fn leave_tournament(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<Tournament>> {
    Ok(Json(
        state
            .tournament_manager
            .leave_tournament(tournament_id, user_id)
            .await?,
    ))
}

pub async fn add_guest(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(tournament_id): Path<TournamentId>,
    ApiJson(request): ApiJson<GuestRequest>,
) -> ApiResult<Json<Tournament>> {
    Ok(Json(
        state
            .tournament_manager
            .add_guest(user_id, tournament_id, request.name)
            .await?,
    ))
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(tournament_id): Path<TournamentId>,
    ApiJson(request): ApiJson<StatusRequest>,
) -> ApiResult<Json<Tournament>> {
    Ok(Json(
        state
            .tournament_manager
            .update_status(user_id, tournament_id, request.status, request.winner)
            .await?,
    ))
}

/// Delete a tournament and its matches
pub async fn delete_tournament(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<StatusCode> {
    state
        .tournament_manager
        .delete_tournament(user_id, tournament_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

//! Channel API handlers.
//!
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/channels \
//!   -H "Authorization: Bearer $TOKEN" \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "Friday Futsal", "sport": "futsal"}'
//! ```

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use leaguelink::{
    UserId,
    channel::{Channel, ChannelId, ChannelUpdate, CreateChannelRequest},
};
use serde::Deserialize;

use super::{
    AppState,
    error::{ApiJson, ApiResult},
};
use crate::metrics;

/// Body naming the user a membership change applies to
#[derive(Debug, Deserialize)]
pub struct MemberRequest {
    pub user_id: UserId,
}

/// Channels the caller may see
pub async fn list_channels(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> ApiResult<Json<Vec<Channel>>> {
    Ok(Json(state.channel_manager.list_channels(user_id).await?))
}

/// Create a channel owned by the caller
pub async fn create_channel(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    ApiJson(request): ApiJson<CreateChannelRequest>,
) -> ApiResult<(StatusCode, Json<Channel>)> {
    let channel = state
        .channel_manager
        .create_channel(user_id, request)
        .await?;
    metrics::channels_created_total();

    Ok((StatusCode::CREATED, Json(channel)))
}

pub async fn get_channel(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(channel_id): Path<ChannelId>,
) -> ApiResult<Json<Channel>> {
    Ok(Json(
        state.channel_manager.get_channel(user_id, channel_id).await?,
    ))
}

pub async fn update_channel(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(channel_id): Path<ChannelId>,
    ApiJson(update): ApiJson<ChannelUpdate>,
) -> ApiResult<Json<Channel>> {
    Ok(Json(
        state
            .channel_manager
            .update_channel(user_id, channel_id, update)
            .await?,
    ))
}

/// Delete a channel along with its tournaments and matches (owner only)
pub async fn delete_channel(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(channel_id): Path<ChannelId>,
) -> ApiResult<StatusCode> {
    state
        .channel_manager
        .delete_channel(user_id, channel_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn join_channel(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(channel_id): Path<ChannelId>,
) -> ApiResult<Json<Channel>> {
    Ok(Json(
        state.channel_manager.join_channel(user_id, channel_id).await?,
    ))
}

pub async fn leave_channel(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(channel_id): Path<ChannelId>,
) -> ApiResult<Json<Channel>> {
    Ok(Json(
        state.channel_manager.leave_channel(user_id, channel_id).await?,
    ))
}

/// Add a user to the channel; the only way into a private channel
pub async fn add_member(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(channel_id): Path<ChannelId>,
    ApiJson(request): ApiJson<MemberRequest>,
) -> ApiResult<Json<Channel>> {
    Ok(Json(
        state
            .channel_manager
            .add_member(user_id, channel_id, request.user_id)
            .await?,
    ))
}

pub async fn promote_admin(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(channel_id): Path<ChannelId>,
    ApiJson(request): ApiJson<MemberRequest>,
) -> ApiResult<Json<Channel>> {
    Ok(Json(
        state
            .channel_manager
            .promote_admin(user_id, channel_id, request.user_id)
            .await?,
    ))
}

//! Authentication and profile API handlers.
//!
//! # Examples
//!
//! Register a new user:
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/auth/register \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "keeper1", "password": "Pass1234", "display_name": "Keeper One"}'
//! ```
//!
//! Login:
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/auth/login \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "keeper1", "password": "Pass1234"}'
//! ```

use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use leaguelink::{
    UserId,
    auth::{AuthError, LoginRequest, ProfileUpdate, RegisterRequest, User},
};
use serde::Serialize;

use super::{
    AppState,
    error::{ApiJson, ApiResult},
};
use crate::{logging, metrics};

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// Register a new user account and log them in.
///
/// # Request Body
///
/// ```json
/// {
///   "username": "keeper1",
///   "password": "Pass1234",
///   "display_name": "Keeper One",
///   "email": "keeper@example.com"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Username or email taken, weak password, invalid input
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let user = state.auth_manager.register(request).await?;
    let token = state.auth_manager.issue_token(&user)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            access_token: token.access_token,
            expires_at: token.expires_at,
            user,
        }),
    ))
}

/// Authenticate a user and issue an access token.
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown user or wrong password
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let username = request.username.clone();

    match state.auth_manager.login(request).await {
        Ok((user, token)) => {
            metrics::login_attempts_total(true);
            Ok(Json(AuthResponse {
                access_token: token.access_token,
                expires_at: token.expires_at,
                user,
            }))
        }
        Err(e) => {
            metrics::login_attempts_total(false);
            if matches!(e, AuthError::InvalidCredentials) {
                logging::log_security_event(
                    "failed_login",
                    None,
                    Some("/api/v1/auth/login"),
                    &format!("Invalid credentials for '{username}'"),
                );
            }
            Err(e.into())
        }
    }
}

/// Current user's profile
pub async fn me(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.auth_manager.get_user(user_id).await?))
}

/// Update display name, bio or avatar of the current user
pub async fn update_me(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.auth_manager.update_profile(user_id, update).await?))
}

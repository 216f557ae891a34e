//! REST API for LeagueLink.
//!
//! # Modules
//!
//! - [`auth`]: Registration, login and the current user's profile
//! - [`channels`]: Channel CRUD and membership
//! - [`tournaments`]: Tournaments, participants and channel stats
//! - [`matches`]: Matches, scores, bracket creation
//! - [`middleware`]: Authentication middleware for protected endpoints
//! - [`request_id`]: Request ids, access logging and HTTP metrics
//! - [`error`]: Domain error to HTTP response mapping
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use leaguelink::db::Repositories;
//! use leaguelink_server::api::{AppState, create_router};
//! use leaguelink_server::config::SecurityConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let security = SecurityConfig {
//!     jwt_secret: "a-secret-that-is-at-least-32-bytes-long".to_string(),
//!     password_pepper: "a-pepper-of-16-bytes".to_string(),
//!     token_ttl_hours: 24,
//! };
//! let state = AppState::new(&Repositories::in_memory(), &security, None);
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively. In production, configure appropriate
//! origins, methods, and headers.

pub mod auth;
pub mod channels;
pub mod error;
pub mod matches;
pub mod middleware;
pub mod request_id;
pub mod tournaments;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, patch, post},
};
use leaguelink::{
    AuthManager, ChannelManager, MatchManager, TournamentManager,
    db::{Database, Repositories},
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::config::SecurityConfig;
use request_id::RequestId;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; every manager sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub auth_manager: Arc<AuthManager>,
    pub channel_manager: Arc<ChannelManager>,
    pub tournament_manager: Arc<TournamentManager>,
    pub match_manager: Arc<MatchManager>,
    /// Present when backed by PostgreSQL; used by the health check
    pub database: Option<Database>,
}

impl AppState {
    /// Build every manager over one set of repositories
    pub fn new(
        repos: &Repositories,
        security: &SecurityConfig,
        database: Option<Database>,
    ) -> Self {
        let auth_manager = AuthManager::new(
            repos.users.clone(),
            security.password_pepper.clone(),
            security.jwt_secret.clone(),
        )
        .with_token_ttl(chrono::Duration::hours(security.token_ttl_hours));

        Self {
            auth_manager: Arc::new(auth_manager),
            channel_manager: Arc::new(ChannelManager::new(repos)),
            tournament_manager: Arc::new(TournamentManager::new(repos)),
            match_manager: Arc::new(MatchManager::new(repos)),
            database,
        }
    }
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Endpoint Summary
///
/// ```text
/// GET    /health                                    - Health check (public)
/// POST   /api/v1/auth/register                      - Register user (public)
/// POST   /api/v1/auth/login                         - Login (public)
/// GET    /api/v1/users/me                           - Current user
/// PATCH  /api/v1/users/me                           - Update profile
/// GET    /api/v1/channels                           - Visible channels
/// POST   /api/v1/channels                           - Create channel
/// GET    /api/v1/channels/{id}                      - Channel details
/// PATCH  /api/v1/channels/{id}                      - Update channel
/// DELETE /api/v1/channels/{id}                      - Delete channel
/// POST   /api/v1/channels/{id}/join                 - Join public channel
/// POST   /api/v1/channels/{id}/leave                - Leave channel
/// POST   /api/v1/channels/{id}/members              - Add member
/// POST   /api/v1/channels/{id}/admins               - Promote admin
/// POST   /api/v1/tournaments                        - Create tournament
/// GET    /api/v1/tournaments/{id}                   - Tournament details
/// GET    /api/v1/tournaments/channel/{channel_id}   - Tournaments of a channel
/// GET    /api/v1/tournaments/stats/channel/{id}     - Per-user channel stats
/// POST   /api/v1/tournaments/{id}/join              - Join tournament
/// POST   /api/v1/tournaments/{id}/leave             - Leave tournament
/// POST   /api/v1/tournaments/{id}/guests            - Add guest participant
/// PATCH  /api/v1/tournaments/{id}/status            - Advance status
/// DELETE /api/v1/tournaments/{id}                   - Delete tournament
/// POST   /api/v1/tournaments/{id}/bulk              - Create a bracket
/// GET    /api/v1/tournaments/{id}/matches           - Matches of a tournament
/// POST   /api/v1/matches                            - Create match
/// GET    /api/v1/matches/{id}                       - Match details
/// PATCH  /api/v1/matches/{id}/status                - Set score
/// POST   /api/v1/matches/{id}/games                 - Record game result
/// PATCH  /api/v1/matches/{id}/stats                 - Merge stats
/// DELETE /api/v1/matches/{id}                       - Delete match
/// ```
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router(state.clone());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Create API v1 router with all versioned endpoints.
fn create_v1_router(state: AppState) -> Router<AppState> {
    // Public routes (no authentication middleware)
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    // Protected routes (require authentication middleware)
    let protected_routes = Router::new()
        .route("/users/me", get(auth::me).patch(auth::update_me))
        .route(
            "/channels",
            get(channels::list_channels).post(channels::create_channel),
        )
        .route(
            "/channels/{id}",
            get(channels::get_channel)
                .patch(channels::update_channel)
                .delete(channels::delete_channel),
        )
        .route("/channels/{id}/join", post(channels::join_channel))
        .route("/channels/{id}/leave", post(channels::leave_channel))
        .route("/channels/{id}/members", post(channels::add_member))
        .route("/channels/{id}/admins", post(channels::promote_admin))
        .route("/tournaments", post(tournaments::create_tournament))
        .route(
            "/tournaments/{id}",
            get(tournaments::get_tournament).delete(tournaments::delete_tournament),
        )
        .route(
            "/tournaments/channel/{channel_id}",
            get(tournaments::list_by_channel),
        )
        .route(
            "/tournaments/stats/channel/{channel_id}",
            get(tournaments::channel_stats),
        )
        .route("/tournaments/{id}/join", post(tournaments::join_tournament))
        .route("/tournaments/{id}/leave", post(tournaments::leave_tournament))
        .route("/tournaments/{id}/guests", post(tournaments::add_guest))
        .route("/tournaments/{id}/status", patch(tournaments::update_status))
        .route("/tournaments/{id}/bulk", post(matches::bulk_create_matches))
        .route("/tournaments/{id}/matches", get(matches::list_matches))
        .route("/matches", post(matches::create_match))
        .route(
            "/matches/{id}",
            get(matches::get_match).delete(matches::delete_match),
        )
        .route("/matches/{id}/status", patch(matches::set_score))
        .route("/matches/{id}/games", post(matches::record_game))
        .route("/matches/{id}/stats", patch(matches::update_stats))
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth_middleware,
        ));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the store is reachable, `503 Service Unavailable`
/// otherwise. The in-memory store is always healthy.
///
/// ```bash
/// curl http://localhost:8080/health
/// # {"status":"healthy","storage":"postgres","database":true,...}
/// ```
async fn health_check(State(state): State<AppState>, request_id: RequestId) -> impl IntoResponse {
    let (storage, db_healthy) = match &state.database {
        Some(db) => ("postgres", db.health_check().await.is_ok()),
        None => ("memory", true),
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage,
        "database": db_healthy,
        "request_id": request_id.as_str(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}

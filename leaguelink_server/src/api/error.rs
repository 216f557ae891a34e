//! Conversion of domain errors into HTTP responses.
//!
//! Every domain error exposes an [`ErrorKind`] and a client-safe message;
//! [`ApiError`] turns that pair into a status code and a JSON body:
//!
//! ```json
//! { "error": "Tournament is full", "kind": "validation" }
//! ```
//!
//! Request bodies are read through [`ApiJson`], so a malformed or mistyped
//! body gets the same shape with kind `validation` instead of axum's plain
//! text 422.

use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use leaguelink::{
    ErrorKind, auth::AuthError, bracket::MatchError, channel::ChannelError,
    tournament::TournamentError,
};
use serde::Serialize;

use crate::{logging, metrics};

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKind,
}

/// Error returned by every handler
#[derive(Debug)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        status_for(self.kind)
    }

    /// Build from a domain error, logging the full error where the client
    /// only sees the sanitized message
    fn from_domain(kind: ErrorKind, client_message: String, detail: &dyn std::fmt::Display) -> Self {
        match kind {
            ErrorKind::Internal => tracing::error!(error = %detail, "Request failed"),
            ErrorKind::Forbidden => {
                metrics::authorization_denied_total();
                logging::log_security_event("forbidden", None, None, &client_message);
            }
            _ => tracing::debug!(error = %detail, "Request rejected"),
        }
        Self::new(kind, client_message)
    }
}

/// HTTP status for an error category
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message,
            kind: self.kind,
        };
        (status_for(self.kind), Json(body)).into_response()
    }
}

macro_rules! impl_from_domain_error {
    ($($error:ty),* $(,)?) => {
        $(
            impl From<$error> for ApiError {
                fn from(err: $error) -> Self {
                    ApiError::from_domain(err.kind(), err.client_message(), &err)
                }
            }
        )*
    };
}

impl_from_domain_error!(AuthError, ChannelError, TournamentError, MatchError);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(status = %rejection.status(), "Request body rejected");
        ApiError::new(ErrorKind::Validation, rejection.body_text())
    }
}

/// `Json` extractor whose rejection is an [`ApiError`]
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use leaguelink::db::StoreError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(ErrorKind::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(ErrorKind::Internal),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_domain_errors_map_to_status() {
        let full: ApiError = TournamentError::TournamentFull.into();
        assert_eq!(full.status(), StatusCode::BAD_REQUEST);

        let missing: ApiError = MatchError::NotFound(7).into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let denied: ApiError = ChannelError::Forbidden("manage this channel").into();
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);

        let bad_login: ApiError = AuthError::InvalidCredentials.into();
        assert_eq!(bad_login.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err: ApiError = MatchError::Store(StoreError::Corrupt("best_of = 2".into())).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("best_of"));
    }
}

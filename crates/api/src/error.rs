//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as JSON
//! `{"error": "...", "field": "..."}`, where `field` is present only for
//! validation failures. Server errors are captured to Sentry before
//! responding, and their details never reach the client.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use emporium_core::ValidationErrors;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request entity failed its field rules.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    /// Bad request from client (malformed JSON, bad path or query).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Authenticated, but the role does not allow the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate entity or illegal state change.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// A dependency is down.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("resource not found".to_owned()),
            RepositoryError::Conflict(message) => Self::Conflict(message),
            RepositoryError::Invalid(errors) => Self::Validation(errors),
            other => Self::Database(other),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Auth(err) => auth_status(err),
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            Self::Validation(errors) => validation_body(errors),
            Self::Auth(AuthError::Validation(errors)) => validation_body(errors),
            Self::Auth(AuthError::Repository(err)) => repository_body(err),
            Self::Auth(AuthError::PasswordHash | AuthError::TokenEncoding(_))
            | Self::Database(_)
            | Self::Internal(_) => message_body(INTERNAL_MESSAGE),
            Self::Auth(err) => message_body(&err.to_string()),
            Self::BadRequest(message)
            | Self::Forbidden(message)
            | Self::NotFound(message)
            | Self::Conflict(message)
            | Self::Unavailable(message) => message_body(message),
        }
    }
}

fn auth_status(err: &AuthError) -> StatusCode {
    match err {
        e if e.is_unauthorized() => StatusCode::UNAUTHORIZED,
        AuthError::UserAlreadyExists(_) => StatusCode::CONFLICT,
        AuthError::Validation(_) => StatusCode::BAD_REQUEST,
        AuthError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        AuthError::Repository(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
        AuthError::Repository(RepositoryError::Invalid(_)) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_body(message: &str) -> ErrorBody {
    ErrorBody {
        error: message.to_owned(),
        field: None,
    }
}

fn validation_body(errors: &ValidationErrors) -> ErrorBody {
    let first = errors.first();
    ErrorBody {
        error: first.to_string(),
        field: Some(first.field.clone()),
    }
}

fn repository_body(err: &RepositoryError) -> ErrorBody {
    match err {
        RepositoryError::NotFound => message_body("resource not found"),
        RepositoryError::Conflict(message) => message_body(message),
        RepositoryError::Invalid(errors) => validation_body(errors),
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            message_body(INTERNAL_MESSAGE)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(self.body())).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the current request.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order 7".to_string());
        assert_eq!(err.to_string(), "Not found: order 7");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Unavailable("x".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_error_status_codes() {
        for err in [
            AuthError::MissingToken,
            AuthError::InvalidSignature,
            AuthError::TokenExpired,
            AuthError::MalformedToken,
            AuthError::TokenRevoked,
            AuthError::WrongTokenType,
            AuthError::InvalidCredentials,
        ] {
            assert_eq!(AppError::Auth(err).status(), StatusCode::UNAUTHORIZED);
        }
        assert_eq!(
            AppError::Auth(AuthError::UserAlreadyExists("email already exists".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Auth(AuthError::PasswordHash).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_errors_map_to_client_statuses() {
        assert_eq!(
            AppError::from(RepositoryError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(RepositoryError::Conflict("taken".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(RepositoryError::DataCorruption("bad".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_validation_body_names_first_field() {
        let errors = ValidationErrors::single("password", "must be at least 8 characters");
        let (status, body) = render(AppError::Validation(errors)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "password");
        assert_eq!(body["error"], "password must be at least 8 characters");
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let (status, body) = render(AppError::Database(RepositoryError::DataCorruption(
            "users.email = 'x'".into(),
        )))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], INTERNAL_MESSAGE);
        assert!(body.get("field").is_none());
    }
}

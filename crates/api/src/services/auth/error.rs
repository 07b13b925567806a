//! Authentication error types.

use thiserror::Error;

use emporium_core::ValidationErrors;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Username or email already registered.
    #[error("{0}")]
    UserAlreadyExists(String),

    /// No token on a protected request.
    #[error("missing token")]
    MissingToken,

    /// Token signature does not match the server secret.
    #[error("invalid token signature")]
    InvalidSignature,

    /// Token is past its lifetime.
    #[error("token expired")]
    TokenExpired,

    /// Token is not a structurally valid token of ours.
    #[error("malformed token")]
    MalformedToken,

    /// Refresh token no longer matches the stored one.
    #[error("token revoked")]
    TokenRevoked,

    /// Refresh token used as access token or vice versa.
    #[error("wrong token type")]
    WrongTokenType,

    /// Request payload failed validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Token signing error.
    #[error("token encoding error: {0}")]
    TokenEncoding(String),
}

impl AuthError {
    /// Whether the error means the caller is not authenticated (HTTP 401).
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::MissingToken
                | Self::InvalidSignature
                | Self::TokenExpired
                | Self::MalformedToken
                | Self::TokenRevoked
                | Self::WrongTokenType
        )
    }
}

//! Signup, login, token refresh and logout.

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use super::ApiJson;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{LoginRequest, SignupRequest, User, UserProfile};
use crate::services::auth::{AuthService, TokenPair};
use crate::state::AppState;

/// Body returned by signup, login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

impl AuthResponse {
    fn new(user: &User, tokens: TokenPair) -> Self {
        Self {
            user: UserProfile::from(user),
            tokens,
        }
    }
}

/// Body of `POST /users/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Create an account.
#[tracing::instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SignupRequest>,
) -> Result<(StatusCode, ApiJson<AuthResponse>)> {
    let (user, tokens) = AuthService::new(state.store(), state.tokens())
        .signup(request)
        .await?;

    Ok((StatusCode::CREATED, ApiJson(AuthResponse::new(&user, tokens))))
}

/// Log in with username and password.
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<ApiJson<AuthResponse>> {
    let (user, tokens) = AuthService::new(state.store(), state.tokens())
        .login(request)
        .await?;

    Ok(ApiJson(AuthResponse::new(&user, tokens)))
}

/// Rotate the token pair.
#[tracing::instrument(skip_all)]
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RefreshRequest>,
) -> Result<ApiJson<AuthResponse>> {
    let (user, tokens) = AuthService::new(state.store(), state.tokens())
        .refresh(request.refresh_token.trim())
        .await?;

    Ok(ApiJson(AuthResponse::new(&user, tokens)))
}

/// Revoke the stored token pair.
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn logout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<StatusCode> {
    AuthService::new(state.store(), state.tokens())
        .logout(user.id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

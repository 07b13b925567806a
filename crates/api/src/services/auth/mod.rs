//! Authentication service.
//!
//! Signup, login, token refresh and logout on top of the credential
//! manager ([`password`]) and the token issuer ([`tokens`]).

mod error;
pub mod password;
pub mod tokens;

pub use error::AuthError;
pub use password::{hash_password, verify_password};
pub use tokens::{Claims, Identity, TokenIssuer, TokenPair, TokenType};

use emporium_core::{UserId, Validate};

use crate::db::{RepositoryError, Store};
use crate::models::{LoginRequest, NewUser, SignupRequest, User};

/// Authentication service.
///
/// Borrows the storage collaborator and the token issuer from the
/// application state for the duration of one request.
pub struct AuthService<'a> {
    store: &'a dyn Store,
    tokens: &'a TokenIssuer,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Store, tokens: &'a TokenIssuer) -> Self {
        Self { store, tokens }
    }

    /// Register a user and issue their first token pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the request fails its field rules.
    /// Returns `AuthError::UserAlreadyExists` if the username or email is taken.
    pub async fn signup(&self, request: SignupRequest) -> Result<(User, TokenPair), AuthError> {
        request.validate()?;

        let password_hash = hash_password(&request.password)?;
        let new_user = NewUser::from_signup(request, password_hash)?;

        let user = self
            .store
            .create_user(&new_user)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(message) => AuthError::UserAlreadyExists(message),
                other => AuthError::Repository(other),
            })?;

        let (user, pair) = self.issue_and_store(user).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "user signed up");
        Ok((user, pair))
    }

    /// Verify credentials and issue a new token pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username is unknown or
    /// the password is wrong. No tokens are issued in that case.
    pub async fn login(&self, request: LoginRequest) -> Result<(User, TokenPair), AuthError> {
        request.validate()?;

        let user = self
            .store
            .find_user_by_username(request.username.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&request.password, &user.password_hash) {
            tracing::info!(user_id = %user.id, "login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let (user, pair) = self.issue_and_store(user).await?;
        tracing::info!(user_id = %user.id, "user logged in");
        Ok((user, pair))
    }

    /// Exchange a refresh token for a new pair.
    ///
    /// # Errors
    ///
    /// Returns the verifier's error for bad tokens, `AuthError::WrongTokenType`
    /// for access tokens, and `AuthError::TokenRevoked` if the token is not
    /// the one currently stored for the user.
    pub async fn refresh(&self, refresh_token: &str) -> Result<(User, TokenPair), AuthError> {
        let claims = self.tokens.verify_refresh(refresh_token)?;

        let user = self
            .store
            .find_user_by_id(claims.user_id()?)
            .await?
            .ok_or(AuthError::TokenRevoked)?;

        if user.refresh_token.as_deref() != Some(refresh_token) {
            tracing::warn!(user_id = %user.id, "stale refresh token presented");
            return Err(AuthError::TokenRevoked);
        }

        self.issue_and_store(user).await
    }

    /// Forget the stored token pair, revoking the outstanding refresh token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the user row can't be updated.
    pub async fn logout(&self, user_id: UserId) -> Result<(), AuthError> {
        self.store.update_tokens(user_id, None, None).await?;
        tracing::info!(user_id = %user_id, "user logged out");
        Ok(())
    }

    /// Persist `pair` as the user's latest tokens.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the user row can't be updated.
    pub async fn update_stored_tokens(
        &self,
        user_id: UserId,
        pair: &TokenPair,
    ) -> Result<(), AuthError> {
        self.store
            .update_tokens(user_id, Some(&pair.token), Some(&pair.refresh_token))
            .await?;
        Ok(())
    }

    async fn issue_and_store(&self, mut user: User) -> Result<(User, TokenPair), AuthError> {
        let pair = self.tokens.issue_tokens(&Identity::from(&user))?;
        self.update_stored_tokens(user.id, &pair).await?;
        user.token = Some(pair.token.clone());
        user.refresh_token = Some(pair.refresh_token.clone());
        Ok((user, pair))
    }
}

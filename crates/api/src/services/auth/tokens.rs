//! Token issuer and verifier.
//!
//! Tokens are HS256 JWTs sealed with the server secret. Every token moves
//! through `Issued -> Valid -> Expired`; a refresh token additionally becomes
//! revoked once the stored copy on the user row no longer matches it.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use emporium_core::{Email, Role, UserId};

use super::AuthError;
use crate::config::AuthConfig;
use crate::models::User;

/// Issuer written to and required on every token.
pub const ISSUER: &str = "emporium";

/// Distinguishes access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Access => write!(f, "access"),
            Self::Refresh => write!(f, "refresh"),
        }
    }
}

/// Signed claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub token_type: TokenType,
    /// Issuer
    pub iss: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Unique token id; two tokens issued in the same second still differ.
    pub jti: String,
}

impl Claims {
    /// The user id carried in `sub`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MalformedToken` if `sub` is not a user id.
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        self.sub.parse().map_err(|_| AuthError::MalformedToken)
    }
}

/// The identity embedded into a token pair.
#[derive(Debug, Clone, Copy)]
pub struct Identity<'a> {
    pub user_id: UserId,
    pub email: &'a Email,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub role: Role,
}

impl<'a> From<&'a User> for Identity<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            user_id: user.id,
            email: &user.email,
            first_name: &user.first_name,
            last_name: &user.last_name,
            role: user.role,
        }
    }
}

/// An access token and its refresh token.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// Issues and verifies tokens with a single server-held secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: chrono::Duration,
    refresh_ttl: chrono::Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("keys", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.token_secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            access_ttl: config.access_token_ttl,
            refresh_ttl: config.refresh_token_ttl,
        }
    }

    /// Issue a fresh access and refresh token for `identity`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenEncoding` if signing fails.
    pub fn issue_tokens(&self, identity: &Identity<'_>) -> Result<TokenPair, AuthError> {
        self.issue_tokens_at(identity, Utc::now())
    }

    /// Issue a token pair as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenEncoding` if signing fails.
    pub fn issue_tokens_at(
        &self,
        identity: &Identity<'_>,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            token: self.sign(identity, TokenType::Access, now, self.access_ttl)?,
            refresh_token: self.sign(identity, TokenType::Refresh, now, self.refresh_ttl)?,
        })
    }

    fn sign(
        &self,
        identity: &Identity<'_>,
        token_type: TokenType,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            sub: identity.user_id.to_string(),
            email: identity.email.clone(),
            first_name: identity.first_name.to_owned(),
            last_name: identity.last_name.to_owned(),
            role: identity.role,
            token_type,
            iss: ISSUER.to_owned(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenEncoding(e.to_string()))
    }

    /// Check signature and expiry, returning the claims.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidSignature` if the token was tampered with or signed
    ///   with another secret
    /// - `AuthError::TokenExpired` if past its lifetime
    /// - `AuthError::MalformedToken` for anything structurally wrong
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            })
    }

    /// Verify a token that must be an access token.
    ///
    /// # Errors
    ///
    /// As [`Self::verify`], plus `AuthError::WrongTokenType`.
    pub fn verify_access(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_typed(token, TokenType::Access)
    }

    /// Verify a token that must be a refresh token.
    ///
    /// # Errors
    ///
    /// As [`Self::verify`], plus `AuthError::WrongTokenType`.
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_typed(token, TokenType::Refresh)
    }

    fn verify_typed(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError> {
        let claims = self.verify(token)?;
        if claims.token_type != expected {
            tracing::debug!(
                expected = %expected,
                actual = %claims.token_type,
                "token of wrong type presented"
            );
            return Err(AuthError::WrongTokenType);
        }
        Ok(claims)
    }
}

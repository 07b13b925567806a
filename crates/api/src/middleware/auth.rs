//! Access middleware and extractors.
//!
//! [`authenticate`] runs in front of every protected route: it pulls the
//! token from the request, verifies it as an access token and attaches the
//! decoded [`CurrentUser`] to the request extensions. Handlers read it back
//! with [`RequireAuth`]. [`require_admin`] is layered on top for admin routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::Span;

use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentUser;
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Alternative header carrying the raw token.
pub const TOKEN_HEADER: &str = "token";

/// Pull the token from `Authorization: Bearer <token>` or the `token` header.
#[must_use]
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| {
            let (scheme, token) = value.split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then_some(token.trim())
        })
        .filter(|token| !token.is_empty());

    bearer.or_else(|| {
        headers
            .get(TOKEN_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|token| !token.is_empty())
    })
}

/// Reject requests without a valid access token.
///
/// # Errors
///
/// Returns `AuthError::MissingToken` when no token is present, and the
/// verifier's error for tokens that fail verification. The handler is never
/// reached in either case.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(request.headers()).ok_or(AuthError::MissingToken)?;

    let claims = state.tokens().verify_access(token).map_err(|e| {
        tracing::debug!(error = %e, "access token rejected");
        e
    })?;
    let user = CurrentUser::try_from(claims)?;

    Span::current().record("user_id", user.id.as_i32());
    set_sentry_user(&user.id, Some(user.email.as_str()));

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Reject authenticated users whose role is not `admin`.
///
/// Must run after [`authenticate`].
///
/// # Errors
///
/// Returns `AppError::Forbidden` for non-admin users.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AuthError::MissingToken)?;

    if !user.is_admin() {
        tracing::warn!(user_id = %user.id, path = %request.uri().path(), "admin route denied");
        return Err(AppError::Forbidden("admin role required".to_owned()));
    }

    Ok(next.run(request).await)
}

/// Extractor for the authenticated user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AuthError::MissingToken.into())
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_bearer_token() {
        let h = headers(&[("authorization", "Bearer abc.def.ghi")]);
        assert_eq!(extract_token(&h), Some("abc.def.ghi"));

        let h = headers(&[("authorization", "bearer abc")]);
        assert_eq!(extract_token(&h), Some("abc"));
    }

    #[test]
    fn test_token_header() {
        let h = headers(&[("token", "abc.def.ghi")]);
        assert_eq!(extract_token(&h), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_wins_over_token_header() {
        let h = headers(&[("authorization", "Bearer first"), ("token", "second")]);
        assert_eq!(extract_token(&h), Some("first"));
    }

    #[test]
    fn test_missing_or_unusable() {
        assert_eq!(extract_token(&HeaderMap::new()), None);
        assert_eq!(extract_token(&headers(&[("authorization", "Basic dXNlcg==")])), None);
        assert_eq!(extract_token(&headers(&[("token", "  ")])), None);
    }

    #[test]
    fn test_blank_bearer_falls_back_to_token_header() {
        let h = headers(&[("authorization", "Bearer "), ("token", "abc.def.ghi")]);
        assert_eq!(extract_token(&h), Some("abc.def.ghi"));

        let h = headers(&[("authorization", "Bearer    "), ("token", "abc.def.ghi")]);
        assert_eq!(extract_token(&h), Some("abc.def.ghi"));
    }
}

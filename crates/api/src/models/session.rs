//! Request-scoped identity.

use serde::{Deserialize, Serialize};

use emporium_core::{Email, Role, UserId};

use crate::services::auth::{AuthError, Claims};

/// Identity decoded from a verified access token.
///
/// Inserted into request extensions by the authentication middleware and
/// read by handlers through [`crate::middleware::RequireAuth`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Role at the time the token was issued.
    pub role: Role,
}

impl CurrentUser {
    /// Whether this identity may use admin routes.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl TryFrom<Claims> for CurrentUser {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        Ok(Self {
            id: claims.user_id()?,
            email: claims.email,
            role: claims.role,
        })
    }
}

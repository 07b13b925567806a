//! User domain types.
//!
//! [`User`] is the stored record and is never serialized: it carries the
//! password digest and the last issued tokens. Responses use [`UserProfile`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use emporium_core::{
    AddressId, Email, Role, UserId, Validate, ValidationErrors, Validator,
};

/// Username length bounds.
pub const USERNAME_MIN_LENGTH: usize = 3;
pub const USERNAME_MAX_LENGTH: usize = 20;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A registered user (domain type).
#[derive(Clone)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    /// Argon2 PHC string. Never plaintext.
    pub password_hash: String,
    pub email: Email,
    pub phone: String,
    pub role: Role,
    pub address: Address,
    /// Last issued access token.
    pub token: Option<String>,
    /// Last issued refresh token.
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("password_hash", &"[REDACTED]")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

/// A user's postal address. Exactly one per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Address fields as submitted at signup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AddressInput {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl Validate for AddressInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .required("street", &self.street)
            .required("city", &self.city)
            .required("state", &self.state)
            .required("zip_code", &self.zip_code)
            .required("country", &self.country)
            .finish()
    }
}

/// Signup payload.
///
/// Every field defaults to empty so that missing fields surface as
/// validation errors naming the field rather than as JSON errors.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub password: String,
    pub email: String,
    pub phone: String,
    pub address: AddressInput,
}

impl std::fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl Validate for SignupRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        // Checked as stored: trimmed.
        let username = self.username.trim();
        let email = self.email.trim();

        Validator::new()
            .required("username", username)
            .length("username", username, USERNAME_MIN_LENGTH, USERNAME_MAX_LENGTH)
            .required("password", &self.password)
            .min_length("password", &self.password, MIN_PASSWORD_LENGTH)
            .required("email", email)
            .email("email", email)
            .required("first_name", &self.first_name)
            .required("last_name", &self.last_name)
            .required("phone", &self.phone)
            .nested("address", self.address.validate())
            .finish()
    }
}

/// A validated user ready to be stored, with the password already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub password_hash: String,
    pub email: Email,
    pub phone: String,
    pub role: Role,
    pub address: AddressInput,
}

impl NewUser {
    /// Validate a signup request and pair it with its password digest.
    ///
    /// # Errors
    ///
    /// Returns the request's validation failures.
    pub fn from_signup(
        request: SignupRequest,
        password_hash: String,
    ) -> Result<Self, ValidationErrors> {
        request.validate()?;
        let email = Email::parse(request.email.trim())
            .map_err(|e| ValidationErrors::single("email", e.to_string()))?;

        Ok(Self {
            first_name: request.first_name.trim().to_owned(),
            last_name: request.last_name.trim().to_owned(),
            username: request.username.trim().to_owned(),
            password_hash,
            email,
            phone: request.phone.trim().to_owned(),
            role: Role::User,
            address: request.address,
        })
    }
}

/// Login payload.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .required("username", &self.username)
            .required("password", &self.password)
            .finish()
    }
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: Email,
    pub phone: String,
    pub role: Role,
    pub address: Address,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            role: user.role,
            address: user.address.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_signup() -> SignupRequest {
        SignupRequest {
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            username: "ada".to_owned(),
            password: "analytical-engine".to_owned(),
            email: "ada@example.com".to_owned(),
            phone: "+44 20 7946 0000".to_owned(),
            address: AddressInput {
                street: "12 St James's Square".to_owned(),
                city: "London".to_owned(),
                state: "Greater London".to_owned(),
                zip_code: "SW1Y 4LB".to_owned(),
                country: "UK".to_owned(),
            },
        }
    }

    #[test]
    fn test_valid_signup_passes() {
        assert!(valid_signup().validate().is_ok());
    }

    #[test]
    fn test_short_password_is_first_failure_for_partial_payload() {
        let request = SignupRequest {
            username: "abc".to_owned(),
            password: "short".to_owned(),
            ..SignupRequest::default()
        };
        let err = request.validate().unwrap_err();
        assert_eq!(err.first().field, "password");
        assert_eq!(err.first().message, "must be at least 8 characters");
    }

    #[test]
    fn test_username_bounds() {
        let mut request = valid_signup();
        request.username = "ab".to_owned();
        assert_eq!(request.validate().unwrap_err().first().field, "username");

        request.username = "a".repeat(21);
        assert_eq!(request.validate().unwrap_err().first().field, "username");

        request.username = "a".repeat(20);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_padded_username_is_measured_after_trimming() {
        let mut request = valid_signup();
        request.username = "  ab  ".to_owned();
        assert_eq!(request.validate().unwrap_err().first().field, "username");
        assert!(NewUser::from_signup(request, "$argon2id$v=19$...".to_owned()).is_err());

        let mut request = valid_signup();
        request.username = "  ada  ".to_owned();
        let user = NewUser::from_signup(request, "$argon2id$v=19$...".to_owned()).unwrap();
        assert_eq!(user.username, "ada");
    }

    #[test]
    fn test_invalid_email() {
        let mut request = valid_signup();
        request.email = "ada-at-example".to_owned();
        let err = request.validate().unwrap_err();
        assert_eq!(err.first().field, "email");
    }

    #[test]
    fn test_missing_address_fields_are_prefixed() {
        let mut request = valid_signup();
        request.address.city = String::new();
        let err = request.validate().unwrap_err();
        assert_eq!(err.first().field, "address.city");
    }

    #[test]
    fn test_new_user_keeps_hash_not_plaintext() {
        let user = NewUser::from_signup(valid_signup(), "$argon2id$v=19$...".to_owned()).unwrap();
        assert_eq!(user.password_hash, "$argon2id$v=19$...");
        assert_eq!(user.role, Role::User);
        assert!(!format!("{user:?}").contains("analytical-engine"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let debug = format!("{:?}", valid_signup());
        assert!(!debug.contains("analytical-engine"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_login_requires_both_fields() {
        let err = LoginRequest {
            username: "ada".to_owned(),
            password: String::new(),
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.first().field, "password");
    }
}

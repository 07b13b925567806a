//! User repository for database operations.
//!
//! A user row is always read together with its address.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};

use emporium_core::{AddressId, Email, Role, UserId};

use super::RepositoryError;
use crate::models::{Address, NewUser, User};

const SELECT_USER: &str = r"
    SELECT u.id, u.first_name, u.last_name, u.username, u.password_hash, u.email,
           u.phone, u.role, u.token, u.refresh_token, u.created_at, u.updated_at,
           a.id AS address_id, a.street, a.city, a.state, a.zip_code, a.country,
           a.created_at AS address_created_at, a.updated_at AS address_updated_at
    FROM users u
    JOIN addresses a ON a.user_id = u.id
";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    first_name: String,
    last_name: String,
    username: String,
    password_hash: String,
    email: String,
    phone: String,
    role: Role,
    token: Option<String>,
    refresh_token: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    address_id: AddressId,
    street: String,
    city: String,
    state: String,
    zip_code: String,
    country: String,
    address_created_at: DateTime<Utc>,
    address_updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&r.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: r.id,
            first_name: r.first_name,
            last_name: r.last_name,
            username: r.username,
            password_hash: r.password_hash,
            email,
            phone: r.phone,
            role: r.role,
            address: Address {
                id: r.address_id,
                user_id: r.id,
                street: r.street,
                city: r.city,
                state: r.state,
                zip_code: r.zip_code,
                country: r.country,
                created_at: r.address_created_at,
                updated_at: r.address_updated_at,
            },
            token: r.token,
            refresh_token: r.refresh_token,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Map a unique violation on `users` to a conflict naming the field.
fn map_unique_violation(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        let field = match db_err.constraint() {
            Some("users_email_key") => "email",
            _ => "username",
        };
        return RepositoryError::Conflict(format!("{field} already exists"));
    }
    RepositoryError::Database(e)
}

async fn fetch_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: UserId,
) -> Result<Option<User>, RepositoryError> {
    let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE u.id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await?;

    row.map(User::try_from).transpose()
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        fetch_by_id(self.pool, id).await
    }

    /// Get a user by their username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE u.username = $1"))
            .bind(username)
            .fetch_optional(self.pool)
            .await?;

        row.map(User::try_from).transpose()
    }

    /// Create a user and their address in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username or email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: UserId = sqlx::query_scalar(
            r"
            INSERT INTO users (first_name, last_name, username, password_hash, email, phone, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            ",
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.email.as_str())
        .bind(&user.phone)
        .bind(user.role)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        sqlx::query(
            r"
            INSERT INTO addresses (user_id, street, city, state, zip_code, country)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(id)
        .bind(&user.address.street)
        .bind(&user.address.city)
        .bind(&user.address.state)
        .bind(&user.address.zip_code)
        .bind(&user.address.country)
        .execute(&mut *tx)
        .await?;

        let created = fetch_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| RepositoryError::DataCorruption("user vanished after insert".to_owned()))?;

        tx.commit().await?;
        Ok(created)
    }

    /// Store the latest issued token pair.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update_tokens(
        &self,
        id: UserId,
        token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET token = $2, refresh_token = $3, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(token)
        .bind(refresh_token)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Change a user's role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has that username.
    pub async fn set_role(&self, username: &str, role: Role) -> Result<User, RepositoryError> {
        let id: Option<UserId> = sqlx::query_scalar(
            r"
            UPDATE users SET role = $2, updated_at = NOW()
            WHERE username = $1
            RETURNING id
            ",
        )
        .bind(username)
        .bind(role)
        .fetch_optional(self.pool)
        .await?;

        let id = id.ok_or(RepositoryError::NotFound)?;
        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }
}

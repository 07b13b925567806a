//! Subcommand implementations.

pub mod migrate;
pub mod user;

use secrecy::SecretString;

/// Resolve the database URL the same way the server does.
fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("EMPORIUM_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("EMPORIUM_DATABASE_URL"))
}

/// Errors that can occur while running a command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: user, admin")]
    InvalidRole(String),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] emporium_api::db::RepositoryError),
}

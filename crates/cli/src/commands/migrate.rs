//! Database migration command.
//!
//! ```bash
//! emporium migrate
//! ```
//!
//! Applies `crates/api/migrations/` to the database named by
//! `EMPORIUM_DATABASE_URL` (or `DATABASE_URL`). The server never migrates
//! on startup.

use emporium_api::db::create_pool;

use super::{CommandError, database_url};

/// Run all pending migrations.
pub async fn run() -> Result<(), CommandError> {
    let url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&url).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}

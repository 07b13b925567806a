//! User management commands.
//!
//! ```bash
//! # Promote a user to admin
//! emporium user set-role --username ada --role admin
//! ```
//!
//! Signup always creates plain users, so this is the only way to get an
//! admin account.

use emporium_api::db::{PgStore, Store, create_pool};
use emporium_core::Role;

use super::{CommandError, database_url};

/// Change the role of an existing user.
pub async fn set_role(username: &str, role: &str) -> Result<(), CommandError> {
    let role = parse_role(role)?;
    let url = database_url()?;

    tracing::info!("Connecting to database...");
    let store = PgStore::new(create_pool(&url).await?);

    let user = store.set_user_role(username, role).await?;
    tracing::info!(user_id = %user.id, username = %user.username, %role, "Role updated");
    Ok(())
}

fn parse_role(role: &str) -> Result<Role, CommandError> {
    role.trim()
        .to_ascii_lowercase()
        .parse()
        .map_err(|_| CommandError::InvalidRole(role.to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("admin").unwrap(), Role::Admin);
        assert_eq!(parse_role(" User ").unwrap(), Role::User);
        assert!(matches!(
            parse_role("root"),
            Err(CommandError::InvalidRole(r)) if r == "root"
        ));
    }
}

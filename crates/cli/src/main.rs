//! Emporium CLI - database migrations and user management.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! emporium migrate
//!
//! # Grant the admin role
//! emporium user set-role --username ada --role admin
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "emporium")]
#[command(author, version, about = "Emporium operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Change a user's role
    SetRole {
        /// Username of the account
        #[arg(short, long)]
        username: String,

        /// New role (`user` or `admin`)
        #[arg(short, long)]
        role: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await,
        Commands::User { action } => match action {
            UserAction::SetRole { username, role } => {
                commands::user::set_role(&username, &role).await
            }
        },
    }
}

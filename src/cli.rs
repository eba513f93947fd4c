use clap::{Parser, Subcommand};
use sqlx::SqlitePool;

use crate::store::users::{self, NewUser};

/// Personal learning journal.
#[derive(Parser, Debug)]
#[command(name = "journal", author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the web server (the default).
    Serve,
    /// Create a user account, e.g. the initial administrator.
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "JOURNAL_PASSWORD")]
        password: String,
        /// Give the account admin rights.
        #[arg(long)]
        admin: bool,
    },
}

pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    password: &str,
    admin: bool,
) -> anyhow::Result<()> {
    let user = users::create(
        pool,
        NewUser {
            username,
            email,
            password,
            is_admin: admin,
        },
    )
    .await?;

    println!("Created user:");
    println!("  ID: {}", user.id);
    println!("  Username: {}", user.username);
    println!("  Email: {}", user.email);
    println!("  Admin: {}", user.is_admin);

    Ok(())
}

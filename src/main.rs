use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use journal::cli::{self, Cli, Command};
use journal::config::Config;
use journal::db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("journal=info,tower_http=info")),
        )
        .init();

    let pool = db::init_pool(&config.database_url)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let app = journal::build_app(pool, config.secure_cookies).await?;
            let listener = TcpListener::bind(config.bind_addr).await?;

            tracing::info!("listening on {}", config.bind_addr);
            axum::serve(listener, app).await?;
        }
        Command::CreateUser {
            username,
            email,
            password,
            admin,
        } => cli::create_user(&pool, &username, &email, &password, admin).await?,
    }

    Ok(())
}

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portal_session::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal_session=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let api_url = cli.api_url;

    match cli.command {
        Commands::Init => cli::commands::init().await,
        Commands::Login {
            username,
            password,
            watch,
        } => cli::commands::login(api_url, &username, password, watch).await,
        Commands::Register {
            email,
            username,
            password,
        } => cli::commands::register(api_url, &email, &username, password).await,
        Commands::Status { format } => cli::commands::status(api_url, format).await,
        Commands::Header => cli::commands::header(api_url).await,
        Commands::Decode { token } => cli::commands::decode(&token),
        Commands::Logout => cli::commands::logout(api_url).await,
    }
}

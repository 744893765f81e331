pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    match cli.command {
        None | Some(Commands::Serve) => run_server(config).await,

        Some(Commands::Init) => {
            Config::create_default_if_missing()?;
            println!("✓ Config file created. Edit config.toml and run again.");
            Ok(())
        }

        Some(Commands::LoadIngredients { file }) => cli::cmd_load_ingredients(&config, &file).await,

        Some(Commands::LoadUsers { file, media_dir }) => {
            cli::cmd_load_users(&config, &file, &media_dir).await
        }

        Some(Commands::LoadSubscriptions { file }) => {
            cli::cmd_load_subscriptions(&config, &file).await
        }

        Some(Commands::LoadRecipes { file, media_dir }) => {
            cli::cmd_load_recipes(&config, &file, &media_dir).await
        }
    }
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    info!("Ladle v{} starting...", env!("CARGO_PKG_VERSION"));

    let port = config.server.port;

    let state = api::create_app_state_from_config(config).await?;
    let app = api::router(state).await;

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Web API running at http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {e}"),
    }
}

pub mod algorithm;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod state;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use config::AppConfig;
use db::SqliteRepository;
use state::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Some(path) = cli.database {
        config.database_path = path;
    }
    if let Some(user) = cli.user {
        config.username = user;
    }

    // Ensure data directory exists
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    tracing::info!(path = %config.database_path.display(), "opening database");
    let repository = SqliteRepository::open(&config.database_path)
        .with_context(|| format!("failed to open database {}", config.database_path.display()))?;
    let mut state = AppState::new(repository, config.scheduler)?;
    commands::login(&mut state, &config.username)?;

    cli::execute(&mut state, cli.command, cli.format)
}

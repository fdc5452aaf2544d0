use std::path::PathBuf;

use axum::extract::FromRef;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod assets;
mod commands;
mod config;
mod controllers;
mod db;
mod error;
mod extract;
mod keys;
mod models;
mod sweeper;
mod types;
mod views;

use assets::AnyAssets;
use crate::config::Config;
use db::Database;
pub(crate) use error::{ApiError, ApiResult};
use keys::KeyGenerator;

/// Shared state handed to every handler and background task.
#[derive(Clone, FromRef)]
pub struct App {
    pub config: Config,
    pub keys: KeyGenerator,
    pub database: Database,
    pub assets: AnyAssets,
}

impl App {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let database =
            Database::connect(&config.database.connection_url(), &config.database.table).await?;

        Ok(App {
            keys: KeyGenerator::new(config.keys.length),
            assets: AnyAssets::from_config(&config.assets),
            database,
            config,
        })
    }

    #[cfg(test)]
    pub async fn for_tests() -> Self {
        let config = Config::default();
        App {
            keys: KeyGenerator::new(config.keys.length),
            assets: AnyAssets::from_config(&config.assets),
            database: Database::memory().await,
            config,
        }
    }
}

/// A minimal pastebin.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the TOML config file. A missing file means defaults.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server and the background expiry sweeper.
    Serve,
    /// Delete stale pastes once and exit.
    PurgeExpired,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // try to load .env, ignoring any errors
    _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    let default_level = if config.server.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let app = App::new(config).await?;

    match cli.command {
        Command::Serve => commands::serve::run(app).await,
        Command::PurgeExpired => commands::purge_expired::run(app).await,
    }
}

pub mod commands;
pub mod utils;

use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use crate::app::AppState;
use crate::config::AppConfig;
use crate::database::{self, Store};

#[derive(Parser)]
#[command(name = "hrctl")]
#[command(about = "hrctl - administration tool for the HR Admin API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply the SQL migrations to the configured database")]
    Migrate,

    #[command(about = "Division hierarchy maintenance")]
    Division {
        #[command(subcommand)]
        cmd: commands::division::DivisionCommands,
    },

    #[command(about = "User administration")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },

    #[command(about = "Refresh token housekeeping")]
    Token {
        #[command(subcommand)]
        cmd: commands::token::TokenCommands,
    },

    #[command(about = "Print the OpenAPI document of one API version")]
    Schema(commands::schema::SchemaArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Services wired against the configured store, the same way the server does it
pub async fn open_state(config: &AppConfig) -> anyhow::Result<AppState> {
    config.validate().map_err(anyhow::Error::msg).context("invalid configuration")?;
    let store: Arc<dyn Store> = database::open_store(&config.database).await.context("failed to open the store")?;
    AppState::new(config.clone(), store).context("failed to initialise token signing")
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = crate::config::config();

    match cli.command {
        Commands::Migrate => commands::migrate::handle(config, output_format).await,
        Commands::Schema(args) => commands::schema::handle(args),
        Commands::Division { cmd } => commands::division::handle(cmd, &open_state(config).await?, output_format).await,
        Commands::User { cmd } => commands::user::handle(cmd, &open_state(config).await?, output_format).await,
        Commands::Token { cmd } => commands::token::handle(cmd, &open_state(config).await?, output_format).await,
    }
}

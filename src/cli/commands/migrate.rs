use anyhow::Context;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::{AppConfig, DatabaseEngine};
use crate::database::DatabaseManager;

pub async fn handle(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    if config.database.engine == DatabaseEngine::Memory {
        return output_success(output_format, "In-memory store has no migrations to apply", None);
    }

    let pool = DatabaseManager::connect(&config.database).await.context("failed to connect")?;
    DatabaseManager::migrate(&pool).await.context("failed to apply migrations")?;
    output_success(output_format, "Migrations applied", None)
}

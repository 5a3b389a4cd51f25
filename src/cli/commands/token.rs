use clap::Subcommand;
use serde_json::json;

use crate::app::AppState;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Delete refresh token records that have expired")]
    FlushExpired,
}

pub async fn handle(cmd: TokenCommands, state: &AppState, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::FlushExpired => {
            let removed = state.tokens.flush_expired().await?;
            output_success(
                output_format,
                &format!("Removed {} expired refresh token(s)", removed),
                Some(json!({ "removed": removed })),
            )
        }
    }
}

//! Stagecast Display - Headless Projector Daemon
//!
//! Runs one sync session for the life of the process:
//! - bootstraps a push credential and keeps it renewed
//! - follows the shared game document over push and fallback
//! - logs every phase change and connectivity change
//!
//! Ctrl-C tears the session down cleanly.

use anyhow::{Context, Result};
use clap::Parser;

mod cli;
mod commands;
mod display;
mod identity;
mod logging;

use cli::{Cli, Commands};
use stagecast_core::{SessionSettings, SyncSession};
use stagecast_types::SyncConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init(&cli.log_level, cli.log_dir.as_deref())?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(&cli.config).await,
        Commands::CheckConfig { json } => commands::check_config(&cli.config, json),
    }
}

async fn run(config_path: &std::path::Path) -> Result<()> {
    let config = SyncConfig::load(config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    let identity = match config.identity.as_deref() {
        Some(configured) => configured.to_string(),
        None => identity::resolve(None, &identity::default_path()?)?,
    };

    tracing::info!(
        %identity,
        document_id = %config.document_id,
        "🚀 Stagecast Display v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let collaborators = stagecast_client::collaborators(&config)?;
    let settings = SessionSettings::from_config(&config, identity);
    let (session, events) = SyncSession::start(settings, collaborators);

    let outcome = display::follow(&session, events).await;
    session.shutdown().await;
    outcome
}

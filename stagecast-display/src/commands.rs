use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use stagecast_types::SyncConfig;

pub fn check_config(path: &Path, json: bool) -> Result<()> {
    let config = SyncConfig::load(path)
        .with_context(|| format!("Invalid configuration {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("{} {}", "✓".green(), format!("{} is valid", path.display()).bold());
    println!(
        "  Identity: {}",
        config.identity.as_deref().unwrap_or("(generated on first run)")
    );
    println!("  Issuer: {}", config.issuer_url);
    println!("  Push: {}", config.push_url);
    println!("  Fallback: {} (document '{}')", config.fallback_url, config.document_id);
    println!("  Request timeout: {}s", config.request_timeout_secs);
    println!("  Fallback retry: {}s", config.fallback_retry_secs);
    println!("  Bootstrap retry: {}s", config.bootstrap_retry_secs);
    Ok(())
}

//! Stable client identity.
//!
//! The issuer keys credentials by identity, so it must survive restarts:
//! when the config does not name one, a UUID is generated once and kept in
//! the data directory.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub fn default_path() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("stagecast").join("identity"))
        .context("No data directory on this platform; set `identity` in the config")
}

/// The configured identity, else the persisted one, else a freshly
/// generated and persisted one.
pub fn resolve(configured: Option<&str>, path: &Path) -> Result<String> {
    if let Some(identity) = configured {
        return Ok(identity.to_string());
    }

    if path.exists() {
        let stored = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read identity file {}", path.display()))?;
        let stored = stored.trim();
        if !stored.is_empty() {
            return Ok(stored.to_string());
        }
    }

    let identity = Uuid::new_v4().to_string();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, &identity)
        .with_context(|| format!("Failed to write identity file {}", path.display()))?;
    tracing::info!(%identity, path = %path.display(), "[Session] Generated new client identity");
    Ok(identity)
}

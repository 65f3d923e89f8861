//! Log setup: stdout always, plus a daily-rotated file when `--log-dir` is set.

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "stagecast-display.log";

/// Install the global subscriber. Keep the returned guard alive for the whole
/// process or buffered file output is lost.
pub fn init(level: &str, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout = fmt::layer().with_target(false);

    let Some(dir) = log_dir else {
        tracing_subscriber::registry().with(filter).with(stdout).try_init()?;
        return Ok(None);
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX));
    let file = fmt::layer().with_ansi(false).with_writer(writer);

    tracing_subscriber::registry().with(filter).with(stdout).with(file).try_init()?;
    Ok(Some(guard))
}

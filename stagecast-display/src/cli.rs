use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "stagecast-display",
    about = "Stagecast Display - follows the live game state on a projector",
    version = env!("CARGO_PKG_VERSION"),
    author,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, env = "STAGECAST_CONFIG", default_value = "stagecast.json")]
    pub config: PathBuf,

    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    #[arg(long, help = "Also write daily-rotated log files to this directory")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the display session (default if no command specified)")]
    Run,

    #[command(about = "Validate the configuration file and print it")]
    CheckConfig {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["stagecast-display"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.log_dir.is_none());
    }

    #[test]
    fn test_check_config_subcommand() {
        let cli = Cli::try_parse_from([
            "stagecast-display",
            "--config",
            "/etc/stagecast/show.json",
            "check-config",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/stagecast/show.json"));
        assert!(matches!(cli.command, Some(Commands::CheckConfig { json: true })));
    }
}

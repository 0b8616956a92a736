//! Command-line interface definitions.

pub mod analyze;
pub mod check;
pub mod run;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Hyperbalance - keeps HyperEVM vaults at a 50/50 value split.
#[derive(Parser, Debug)]
#[command(name = "hyperbalance")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rebalance every configured vault in a loop until Ctrl+C
    Run(RunArgs),

    /// Show each vault's allocation and the decision it leads to, without sending transactions
    Analyze(AnalyzeArgs),

    /// Validate configuration and probe the RPC endpoint
    Check(ConfigPathArg),
}

/// Shared argument for commands that only need a config path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Override log level (debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Use JSON log format instead of pretty
    #[arg(long)]
    pub json_logs: bool,

    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,
}

/// Arguments for the `analyze` subcommand.
#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Print the analysis as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_overrides() {
        let cli = Cli::parse_from(["hyperbalance", "run", "-c", "vaults.toml", "--json-logs", "--once"]);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.config, PathBuf::from("vaults.toml"));
                assert!(args.json_logs);
                assert!(args.once);
                assert!(args.log_level.is_none());
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn analyze_defaults_to_config_toml() {
        let cli = Cli::parse_from(["hyperbalance", "analyze", "--json"]);
        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.config, PathBuf::from("config.toml"));
                assert!(args.json);
            }
            other => panic!("expected analyze, got {other:?}"),
        }
    }
}

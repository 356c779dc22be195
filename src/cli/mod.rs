//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for the exporter using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// SFM Exporter - SFM files to JSON Lines on object storage
#[derive(Parser, Debug)]
#[command(name = "sfm-exporter")]
#[command(version, about, long_about = None)]
#[command(author = "SFM Exporter Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "sfm-exporter.toml", env = "SFMX_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SFMX_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export unexported SFM files to object storage
    Export(commands::export::ExportArgs),

    /// Show the export state of every SFM file
    Status(commands::status::StatusArgs),

    /// Download one uploaded batch
    Fetch(commands::fetch::FetchArgs),

    /// Delete every uploaded batch of one file
    Purge(commands::purge::PurgeArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_export() {
        let cli = Cli::parse_from(["sfm-exporter", "export"]);
        assert_eq!(cli.config, "sfm-exporter.toml");
        assert!(matches!(cli.command, Commands::Export(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["sfm-exporter", "--config", "custom.toml", "export"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["sfm-exporter", "--log-level", "debug", "export"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_export_overrides() {
        let cli = Cli::parse_from([
            "sfm-exporter",
            "export",
            "--data-dir",
            "/srv/sfm",
            "--batch-size",
            "-1",
            "--no-compression",
            "--dry-run",
        ]);
        let Commands::Export(args) = cli.command else {
            panic!("expected export");
        };
        assert_eq!(args.data_dir.unwrap().to_str(), Some("/srv/sfm"));
        assert_eq!(args.batch_size, Some(-1));
        assert!(args.no_compression);
        assert!(args.dry_run);
    }

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::parse_from(["sfm-exporter", "status", "--remote"]);
        assert!(matches!(cli.command, Commands::Status(ref a) if a.remote));
    }

    #[test]
    fn test_cli_parse_fetch() {
        let cli = Cli::parse_from(["sfm-exporter", "fetch", "run/batch-0.json.gz", "--decompress"]);
        let Commands::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.key, "run/batch-0.json.gz");
        assert!(args.decompress);
    }

    #[test]
    fn test_cli_parse_purge() {
        let cli = Cli::parse_from(["sfm-exporter", "purge", "run", "--yes"]);
        assert!(matches!(cli.command, Commands::Purge(ref a) if a.file_stem == "run" && a.yes));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["sfm-exporter", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["sfm-exporter", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}

//! CLI interface for Daybook
//!
//! This module provides the command-line interface using clap's derive API.
//! It defines all commands and global flags for the daybook binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Daybook Task Extraction Engine
///
/// Turns morning pages and other free-form notes into validated tasks and
/// publishes them to your task service.
#[derive(Parser, Debug)]
#[command(name = "daybook")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract tasks from a note
    Extract {
        /// Note file to read; stdin when omitted
        file: Option<PathBuf>,

        /// Source label recorded with the extraction
        #[arg(long, default_value = "morning_pages")]
        source: String,

        /// Publish the extracted tasks to the task service
        #[arg(long)]
        publish: bool,

        /// Go through publishing without creating anything remotely
        #[arg(long)]
        simulate: bool,
    },

    /// Show provider and credential availability
    Status,

    /// Run system diagnostics
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["daybook", "status"]);
        assert!(matches!(cli.command, Command::Status));
        assert!(!cli.json);
        assert!(cli.log.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["daybook", "--json", "--log", "debug", "status"]);
        assert!(cli.json);
        assert_eq!(cli.log, Some("debug".to_string()));
    }

    #[test]
    fn test_extract_defaults() {
        let cli = Cli::parse_from(["daybook", "extract", "notes/today.md"]);
        if let Command::Extract {
            file,
            source,
            publish,
            simulate,
        } = cli.command
        {
            assert_eq!(file, Some(PathBuf::from("notes/today.md")));
            assert_eq!(source, "morning_pages");
            assert!(!publish);
            assert!(!simulate);
        } else {
            panic!("Expected Extract command");
        }
    }

    #[test]
    fn test_extract_with_publish_and_source() {
        let cli = Cli::parse_from([
            "daybook", "extract", "--publish", "--source", "voice_memo",
        ]);
        if let Command::Extract {
            file,
            source,
            publish,
            ..
        } = cli.command
        {
            assert!(file.is_none());
            assert_eq!(source, "voice_memo");
            assert!(publish);
        } else {
            panic!("Expected Extract command");
        }
    }

    #[test]
    fn test_config_validate() {
        let cli = Cli::parse_from(["daybook", "config", "validate"]);
        if let Command::Config { action } = cli.command {
            assert!(matches!(action, ConfigAction::Validate));
        } else {
            panic!("Expected Config command");
        }
    }
}

//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for the vault using clap.

pub mod commands;

use crate::config::{load_config, LoggingConfig};
use clap::{Parser, Subcommand};

/// Console level when neither the flag nor the config file sets one
const FALLBACK_LOG_LEVEL: &str = "warn";

/// dhp-vault - Versioned patient document store
#[derive(Parser, Debug)]
#[command(name = "dhp-vault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "dhp-vault.toml", env = "DHP_VAULT_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "DHP_VAULT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log level and logging section for the process
    ///
    /// `--log-level` wins over `[application] log_level`. If the config file
    /// cannot be loaded, logging is console-only at `warn`; the command itself
    /// reports the load failure.
    pub fn logging_settings(&self) -> (String, LoggingConfig) {
        match load_config(&self.config) {
            Ok(config) => (
                self.log_level
                    .clone()
                    .unwrap_or(config.application.log_level),
                config.logging,
            ),
            Err(_) => (
                self.log_level
                    .clone()
                    .unwrap_or_else(|| FALLBACK_LOG_LEVEL.to_string()),
                LoggingConfig::default(),
            ),
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database tables if they don't exist
    InitDb(commands::init_db::InitDbArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Push a new document version from a JSON file
    Push(commands::push::PushArgs),

    /// Print the current version of a document
    Show(commands::show::ShowArgs),

    /// List the retained versions of a document
    History(commands::history::HistoryArgs),

    /// Discard the newest versions of a document
    Rollback(commands::rollback::RollbackArgs),

    /// Write the current version of a document to a JSON file
    Export(commands::export::ExportArgs),
}

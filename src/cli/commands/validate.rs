//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the vault configuration file.

use super::report_failure;
use crate::adapters::database::create_history_storage;
use crate::config::load_config;
use crate::config::schema::{DatabaseTarget, VaultConfig};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug, Default)]
pub struct ValidateArgs {
    /// Also connect to the configured backend
    #[arg(long)]
    pub check_connection: bool,
}

impl ValidateArgs {
    /// Execute the validate-config command
    ///
    /// `load_config` validates as part of loading, so a loaded config is a valid one.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(2);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  History Limit: {}", config.store.history_limit);

        match config.database_target {
            DatabaseTarget::PostgreSQL => {
                if let Some(ref pg_config) = config.postgresql {
                    println!("  Database Target: PostgreSQL");
                    println!(
                        "  PostgreSQL Server: {}:{}/{}",
                        pg_config.host, pg_config.port, pg_config.database
                    );
                    println!("  PostgreSQL User: {}", pg_config.user);
                    println!("  Max Connections: {}", pg_config.max_connections);
                    println!("  SSL Mode: {}", pg_config.ssl_mode);
                }
            }
            DatabaseTarget::Memory => {
                println!("  Database Target: Memory (not persisted)");
            }
        }

        if config.logging.local_enabled {
            println!(
                "  File Logging: {} ({})",
                config.logging.local_path, config.logging.local_rotation
            );
        }
        println!();

        if self.check_connection {
            return Ok(check_connection(&config).await);
        }
        Ok(0)
    }
}

async fn check_connection(config: &VaultConfig) -> i32 {
    println!("🔌 Testing backend connection...");

    let storage = match create_history_storage(config).await {
        Ok(storage) => storage,
        Err(e) => return report_failure("Failed to create storage backend", &e),
    };

    let result = storage.test_connection().await;
    // Only the connection test decides the exit code
    let _ = storage.close().await;

    match result {
        Ok(()) => {
            println!("✅ Connected to {} backend", storage.backend_name());
            0
        }
        Err(e) => report_failure("Backend connection failed", &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_validate_memory_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "database_target = \"memory\"").unwrap();

        let code = ValidateArgs::default()
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_validate_checks_memory_connection() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "database_target = \"memory\"").unwrap();

        let args = ValidateArgs {
            check_connection: true,
        };
        let code = args.execute(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_validate_unreachable_postgresql() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"database_target = "postgresql"

[postgresql]
host = "127.0.0.1"
port = 1
database = "dhp_vault"
user = "vault"
password = "secret"
connection_timeout_seconds = 1
"#
        )
        .unwrap();

        let args = ValidateArgs {
            check_connection: true,
        };
        let code = args.execute(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(code, 4);
    }

    #[tokio::test]
    async fn test_validate_missing_file() {
        let code = ValidateArgs::default()
            .execute("/nonexistent/dhp-vault.toml")
            .await
            .unwrap();
        assert_eq!(code, 2);
    }
}

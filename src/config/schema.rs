//! Configuration schema types
//!
//! This module defines the configuration structure that maps to the TOML file.

use crate::config::SecretString;
use crate::core::chain::HistoryLimit;
use serde::{Deserialize, Serialize};

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseTarget {
    /// PostgreSQL database
    PostgreSQL,
    /// Process-local storage, lost on exit
    Memory,
}

/// Main vault configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Storage backend (postgresql or memory)
    pub database_target: DatabaseTarget,

    /// Version history settings
    #[serde(default)]
    pub store: StoreConfig,

    /// PostgreSQL configuration (required if database_target = postgresql)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postgresql: Option<PostgreSQLConfig>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl VaultConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.store.validate()?;

        // Only the active backend's section is validated
        if self.database_target == DatabaseTarget::PostgreSQL {
            match self.postgresql {
                Some(ref config) => config.validate()?,
                None => {
                    return Err(
                        "postgresql configuration is required when database_target = 'postgresql'"
                            .to_string(),
                    )
                }
            }
        }

        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Version history configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum number of versions retained per patient and document kind.
    /// Changing it for an existing database requires a migration.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl StoreConfig {
    fn validate(&self) -> Result<(), String> {
        if self.history_limit == 0 || self.history_limit > HistoryLimit::MAX {
            return Err(format!(
                "store.history_limit must be between 1 and {}, got {}",
                HistoryLimit::MAX,
                self.history_limit
            ));
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
        }
    }
}

/// PostgreSQL database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgreSQLConfig {
    /// Server host name or address
    pub host: String,

    /// Server port
    #[serde(default = "default_pg_port")]
    pub port: u16,

    /// Database name
    pub database: String,

    /// Login role
    pub user: String,

    /// Login password
    /// Stored securely in memory and automatically zeroized on drop
    pub password: SecretString,

    /// Maximum number of connections in the pool
    #[serde(default = "default_pg_max_connections")]
    pub max_connections: usize,

    /// Connection timeout in seconds
    #[serde(default = "default_pg_connection_timeout_seconds")]
    pub connection_timeout_seconds: u64,

    /// Statement timeout in seconds
    #[serde(default = "default_pg_statement_timeout_seconds")]
    pub statement_timeout_seconds: u64,

    /// SSL negotiation mode (disable or prefer)
    #[serde(default = "default_pg_ssl_mode")]
    pub ssl_mode: String,
}

impl PostgreSQLConfig {
    fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("postgresql.host cannot be empty".to_string());
        }

        if self.database.trim().is_empty() {
            return Err("postgresql.database cannot be empty".to_string());
        }

        if self.user.trim().is_empty() {
            return Err("postgresql.user cannot be empty".to_string());
        }

        if self.port == 0 {
            return Err("postgresql.port must be > 0".to_string());
        }

        if self.max_connections == 0 || self.max_connections > 100 {
            return Err(format!(
                "postgresql.max_connections must be between 1 and 100, got {}",
                self.max_connections
            ));
        }

        if self.connection_timeout_seconds == 0 {
            return Err("postgresql.connection_timeout_seconds must be > 0".to_string());
        }

        let valid_ssl_modes = ["disable", "prefer"];
        if !valid_ssl_modes.contains(&self.ssl_mode.as_str()) {
            return Err(format!(
                "postgresql.ssl_mode must be one of: {}, got '{}'",
                valid_ssl_modes.join(", "),
                self.ssl_mode
            ));
        }

        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_history_limit() -> usize {
    10
}

fn default_pg_port() -> u16 {
    5432
}

fn default_pg_max_connections() -> usize {
    10
}

fn default_pg_connection_timeout_seconds() -> u64 {
    30
}

fn default_pg_statement_timeout_seconds() -> u64 {
    60
}

fn default_pg_ssl_mode() -> String {
    "prefer".to_string()
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    fn pg_config() -> PostgreSQLConfig {
        PostgreSQLConfig {
            host: "localhost".to_string(),
            port: 5432,
            database: "patients".to_string(),
            user: "vault".to_string(),
            password: secret_string("pass".to_string()),
            max_connections: 10,
            connection_timeout_seconds: 30,
            statement_timeout_seconds: 60,
            ssl_mode: "prefer".to_string(),
        }
    }

    fn config(target: DatabaseTarget) -> VaultConfig {
        VaultConfig {
            application: ApplicationConfig::default(),
            database_target: target,
            store: StoreConfig::default(),
            postgresql: Some(pg_config()),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig::default();
        assert!(config.validate().is_ok());

        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_history_limit_bounds() {
        let mut store = StoreConfig::default();
        assert_eq!(store.history_limit, 10);
        assert!(store.validate().is_ok());

        store.history_limit = 0;
        assert!(store.validate().is_err());

        store.history_limit = 1001;
        assert!(store.validate().is_err());
    }

    #[test]
    fn test_postgresql_config_validation() {
        let mut config = pg_config();
        assert!(config.validate().is_ok());

        config.max_connections = 0;
        assert!(config.validate().is_err());

        config.max_connections = 10;
        config.ssl_mode = "verify-full".to_string();
        assert!(config.validate().is_err());

        config.ssl_mode = "disable".to_string();
        config.host = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_postgresql_section_required_for_postgresql_target() {
        let mut config = config(DatabaseTarget::PostgreSQL);
        assert!(config.validate().is_ok());

        config.postgresql = None;
        let err = config.validate().unwrap_err();
        assert!(err.contains("postgresql configuration is required"));
    }

    #[test]
    fn test_memory_target_ignores_postgresql_section() {
        let mut config = config(DatabaseTarget::Memory);
        config.postgresql = None;
        assert!(config.validate().is_ok());

        config.postgresql = Some(PostgreSQLConfig {
            max_connections: 0,
            ..pg_config()
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_logging_config_validation() {
        let mut config = LoggingConfig::default();
        assert!(config.validate().is_ok());

        config.local_rotation = "weekly".to_string();
        assert!(config.validate().is_err());

        config.local_rotation = "hourly".to_string();
        config.local_enabled = true;
        config.local_path = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_password_redacted_in_debug() {
        let debug_output = format!("{:?}", pg_config());
        assert!(!debug_output.contains("\"pass\""));
    }
}

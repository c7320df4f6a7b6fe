//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{DatabaseTarget, VaultConfig};
use super::secret::secret_string;
use crate::domain::errors::VaultError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "DHP_VAULT_";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into VaultConfig
/// 4. Applies environment variable overrides (DHP_VAULT_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns `VaultError::Configuration` if any step fails
///
/// # Examples
///
/// ```no_run
/// use dhp_vault::config::loader::load_config;
///
/// let config = load_config("dhp-vault.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<VaultConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(VaultError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        VaultError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text
///
/// Applies the same substitution, overrides and validation as [`load_config`].
///
/// # Errors
///
/// Returns `VaultError::Configuration` if parsing or validation fails
pub fn parse_config(contents: &str) -> Result<VaultConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: VaultConfig = toml::from_str(&contents)
        .map_err(|e| VaultError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        VaultError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied through untouched.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| VaultError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed_line = re.replace_all(line, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    caps[0].to_string()
                }
            }
        });
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(VaultError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_override(key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{key}")).ok()
}

fn parse_override<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        VaultError::Configuration(format!(
            "Invalid value '{value}' for environment override {ENV_PREFIX}{key}"
        ))
    })
}

/// Applies environment variable overrides using the DHP_VAULT_* prefix
///
/// Environment variables follow the pattern: DHP_VAULT_<SECTION>_<KEY>
/// For example: DHP_VAULT_STORE_HISTORY_LIMIT, DHP_VAULT_POSTGRESQL_HOST
fn apply_env_overrides(config: &mut VaultConfig) -> Result<()> {
    if let Some(val) = env_override("APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    if let Some(val) = env_override("DATABASE_TARGET") {
        config.database_target = match val.to_lowercase().as_str() {
            "postgresql" => DatabaseTarget::PostgreSQL,
            "memory" => DatabaseTarget::Memory,
            other => {
                return Err(VaultError::Configuration(format!(
                    "Invalid database target '{other}'. Must be one of: postgresql, memory"
                )))
            }
        };
    }

    if let Some(val) = env_override("STORE_HISTORY_LIMIT") {
        config.store.history_limit = parse_override("STORE_HISTORY_LIMIT", &val)?;
    }

    if let Some(ref mut pg_config) = config.postgresql {
        if let Some(val) = env_override("POSTGRESQL_HOST") {
            pg_config.host = val;
        }
        if let Some(val) = env_override("POSTGRESQL_PORT") {
            pg_config.port = parse_override("POSTGRESQL_PORT", &val)?;
        }
        if let Some(val) = env_override("POSTGRESQL_DATABASE") {
            pg_config.database = val;
        }
        if let Some(val) = env_override("POSTGRESQL_USER") {
            pg_config.user = val;
        }
        if let Some(val) = env_override("POSTGRESQL_PASSWORD") {
            pg_config.password = secret_string(val);
        }
        if let Some(val) = env_override("POSTGRESQL_MAX_CONNECTIONS") {
            pg_config.max_connections = parse_override("POSTGRESQL_MAX_CONNECTIONS", &val)?;
        }
        if let Some(val) = env_override("POSTGRESQL_SSL_MODE") {
            pg_config.ssl_mode = val;
        }
    }

    if let Some(val) = env_override("LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_override("LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Some(val) = env_override("LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Some(val) = env_override("LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}

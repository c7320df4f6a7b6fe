//! Configuration management for the vault.
//!
//! Configuration is read from a TOML file with:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `DHP_VAULT_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Example Configuration
//!
//! ```toml
//! database_target = "postgresql"
//!
//! [application]
//! log_level = "info"
//!
//! [store]
//! history_limit = 10
//!
//! [postgresql]
//! host = "localhost"
//! port = 5432
//! database = "patients"
//! user = "vault"
//! password = "${DHP_VAULT_DB_PASSWORD}"
//!
//! [logging]
//! local_enabled = true
//! local_path = "/var/log/dhp-vault"
//! local_rotation = "daily"
//! ```
//!
//! ```rust,no_run
//! use dhp_vault::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("dhp-vault.toml")?;
//! println!("History limit: {}", config.store.history_limit);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, DatabaseTarget, LoggingConfig, PostgreSQLConfig, StoreConfig, VaultConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};

//! External system integrations.
//!
//! - [`database`] - Storage abstraction layer (trait-based)
//! - [`postgresql`] - PostgreSQL implementation
//! - [`memory`] - In-process implementation for tests and embedding
//!
//! # Design Pattern
//!
//! Adapters isolate the backend behind the [`database::HistoryStorage`]
//! trait, so the registry never sees a driver type and tests can run
//! against [`memory::InMemoryStorage`].
//!
//! ```rust,no_run
//! use dhp_vault::adapters::postgresql::{PostgreSQLAdapter, PostgreSQLClient};
//! use dhp_vault::config::{secret_string, PostgreSQLConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PostgreSQLConfig {
//!     host: "localhost".to_string(),
//!     port: 5432,
//!     database: "patients".to_string(),
//!     user: "vault".to_string(),
//!     password: secret_string("pass".to_string()),
//!     max_connections: 10,
//!     connection_timeout_seconds: 30,
//!     statement_timeout_seconds: 60,
//!     ssl_mode: "prefer".to_string(),
//! };
//!
//! let adapter = PostgreSQLAdapter::new(PostgreSQLClient::new(config).await?);
//! # let _ = adapter;
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod memory;
pub mod postgresql;

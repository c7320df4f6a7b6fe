//! PostgreSQL client implementation
//!
//! This module provides the pooled client the adapter runs its statements
//! and transactions through.

use crate::config::schema::PostgreSQLConfig;
use crate::domain::{Result, VaultError};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::config::SslMode;
use tokio_postgres::NoTls;

/// Bundled schema migration
const INITIAL_SCHEMA: &str = include_str!("../../../migrations/001_initial_schema.sql");

/// PostgreSQL client for the vault
///
/// Owns the connection pool for the lifetime of the store. The pool is
/// created at construction and released by [`PostgreSQLClient::close`].
pub struct PostgreSQLClient {
    /// Connection pool
    pool: Pool,

    /// Configuration
    config: PostgreSQLConfig,
}

impl PostgreSQLClient {
    /// Create a new PostgreSQL client
    ///
    /// Connections are opened lazily by the pool, so an unreachable server
    /// surfaces on first use rather than here.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be built.
    pub async fn new(config: PostgreSQLConfig) -> Result<Self> {
        let password: &str = config.password.expose_secret().as_ref();

        let mut pg_config = tokio_postgres::Config::new();
        pg_config
            .host(&config.host)
            .port(config.port)
            .dbname(&config.database)
            .user(&config.user)
            .password(password)
            .application_name("dhp-vault")
            .connect_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .ssl_mode(match config.ssl_mode.as_str() {
                "disable" => SslMode::Disable,
                _ => SslMode::Prefer,
            });

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );

        let timeout = Some(Duration::from_secs(config.connection_timeout_seconds));
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .wait_timeout(timeout)
            .create_timeout(timeout)
            .recycle_timeout(timeout)
            .runtime(deadpool_postgres::Runtime::Tokio1)
            .build()
            .map_err(|e| {
                VaultError::Configuration(format!("Failed to create connection pool: {}", e))
            })?;

        Ok(Self { pool, config })
    }

    /// Test the connection to PostgreSQL
    pub async fn test_connection(&self) -> Result<()> {
        let client = self.get_connection().await?;

        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| unavailable("Connection test failed", e))?;

        tracing::info!(server = %self.connection_string_safe(), "PostgreSQL connection test successful");
        Ok(())
    }

    /// Ensure the database schema exists
    ///
    /// Runs the bundled migration, which only creates what is missing.
    pub async fn ensure_schema(&self) -> Result<()> {
        let client = self.get_connection().await?;

        client
            .batch_execute(INITIAL_SCHEMA)
            .await
            .map_err(|e| unavailable("Failed to execute migration", e))?;

        tracing::info!("PostgreSQL schema initialized successfully");
        Ok(())
    }

    /// Get a connection from the pool
    ///
    /// # Errors
    ///
    /// Returns `VaultError::PersistenceUnavailable` if no connection can be obtained.
    pub async fn get_connection(&self) -> Result<deadpool_postgres::Object> {
        self.pool
            .get()
            .await
            .map_err(|e| unavailable("Failed to get connection from pool", e))
    }

    /// `SET LOCAL` statement bounding each statement inside a transaction
    pub fn statement_timeout_sql(&self) -> String {
        format!(
            "SET LOCAL statement_timeout = {}",
            self.config.statement_timeout_seconds * 1000
        )
    }

    /// Get the server address without credentials
    pub fn connection_string_safe(&self) -> String {
        format!(
            "postgresql://***@{}:{}/{}",
            self.config.host, self.config.port, self.config.database
        )
    }

    /// Close the pool
    ///
    /// Idle connections are dropped immediately; connections in use are
    /// dropped when returned. Further `get_connection` calls fail.
    pub fn close(&self) {
        if !self.pool.is_closed() {
            self.pool.close();
            tracing::info!(server = %self.connection_string_safe(), "PostgreSQL pool closed");
        }
    }
}

/// Maps a backend failure to `PersistenceUnavailable`
pub(crate) fn unavailable(context: &str, err: impl std::fmt::Display) -> VaultError {
    VaultError::PersistenceUnavailable(format!("{context}: {err}"))
}

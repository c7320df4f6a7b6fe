//! Storage factory
//!
//! Builds the storage backend selected by `database_target`.

use crate::adapters::database::traits::HistoryStorage;
use crate::adapters::memory::InMemoryStorage;
use crate::adapters::postgresql::adapter::PostgreSQLAdapter;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::config::schema::{DatabaseTarget, VaultConfig};
use crate::domain::{Result, VaultError};
use std::sync::Arc;

/// Create a storage backend based on the configuration
///
/// # Arguments
///
/// * `config` - The vault configuration
///
/// # Returns
///
/// Returns an Arc-wrapped trait object that implements HistoryStorage
///
/// # Errors
///
/// Returns an error if the backend cannot be created
pub async fn create_history_storage(
    config: &VaultConfig,
) -> Result<Arc<dyn HistoryStorage + Send + Sync>> {
    match config.database_target {
        DatabaseTarget::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                VaultError::Configuration(
                    "postgresql configuration is required when database_target = 'postgresql'"
                        .to_string(),
                )
            })?;

            tracing::info!("Creating PostgreSQL history storage");
            let client = PostgreSQLClient::new(pg_config.clone()).await?;
            let adapter = PostgreSQLAdapter::new(client);

            Ok(Arc::new(adapter) as Arc<dyn HistoryStorage + Send + Sync>)
        }
        DatabaseTarget::Memory => {
            tracing::info!("Creating in-memory history storage");
            Ok(Arc::new(InMemoryStorage::new()) as Arc<dyn HistoryStorage + Send + Sync>)
        }
    }
}

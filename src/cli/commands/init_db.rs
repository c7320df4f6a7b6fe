//! Init-db command implementation
//!
//! Creates the version tables. Safe to run against an existing schema.

use super::open_store;
use clap::Args;

/// Arguments for the init-db command
#[derive(Args, Debug)]
pub struct InitDbArgs {}

impl InitDbArgs {
    /// Execute the init-db command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Initializing database schema");

        println!("🗄️  Initializing database schema");

        // Opening the store runs the idempotent migration
        let store = match open_store(config_path).await {
            Ok(store) => store,
            Err(code) => return Ok(code),
        };

        println!("✅ Schema ready on {} backend", store.backend_name());
        store.close().await?;
        Ok(0)
    }
}

//! Core business logic for the vault.
//!
//! # Modules
//!
//! - [`chain`] - Bounded version chains and planned mutations
//! - [`registry`] - Per-patient chain ownership, locking and rehydration
//! - [`export`] - JSON export of a chain's current version
//! - [`store`] - The public [`VaultStore`] facade
//!
//! # Mutation Workflow
//!
//! 1. **Resolve**: Find the chain in memory, or rehydrate it from storage
//! 2. **Plan**: Compute the new chain and the durable mutation without touching the old one
//! 3. **Commit**: Apply the mutation to storage in one transaction
//! 4. **Install**: Swap the in-memory snapshot only after the commit succeeded
//!
//! # Example
//!
//! ```rust,no_run
//! use dhp_vault::config::load_config;
//! use dhp_vault::core::VaultStore;
//! use dhp_vault::domain::{DocumentKind, PatientId};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("dhp-vault.toml")?;
//! let store = VaultStore::open(&config).await?;
//!
//! let patient = PatientId::new("P1")?;
//! let head = store.current(DocumentKind::Dhp, &patient).await?;
//! println!("Current DHP version: {}", head.sequence_no);
//!
//! store.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod chain;
pub mod export;
pub mod registry;
pub mod store;

pub use chain::{ChainMutation, HistoryLimit, PlannedChange, VersionChain, VersionEntry};
pub use export::JsonExporter;
pub use registry::{ChainLookup, PatientRegistry};
pub use store::VaultStore;

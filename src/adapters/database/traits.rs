//! Storage abstraction traits
//!
//! This module defines the trait that persistence backends must implement
//! to mirror version chains durably.

use crate::core::chain::{ChainMutation, VersionEntry};
use crate::domain::{ChainKey, Result, SequenceNo};
use async_trait::async_trait;

/// Durable state of one chain as read back from storage
#[derive(Debug, Clone, PartialEq)]
pub struct StoredChain {
    /// Retained entries ordered by sequence number, oldest first
    pub entries: Vec<VersionEntry>,

    /// Highest sequence number ever issued for the chain
    pub last_sequence: SequenceNo,
}

/// Persistence backend for version chains
///
/// Storage is a durable mirror of the in-memory registry, never a second
/// source of truth. Every backend error is reported as
/// `VaultError::PersistenceUnavailable` and is never retried here.
#[async_trait]
pub trait HistoryStorage: Send + Sync {
    /// Test the backend connection
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    async fn test_connection(&self) -> Result<()>;

    /// Create tables and indexes if they don't exist
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    async fn ensure_schema(&self) -> Result<()>;

    /// Load the durable state of a chain
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` if the chain has never been written.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails for reasons other than "not found".
    async fn load_chain(&self, key: &ChainKey) -> Result<Option<StoredChain>>;

    /// Atomically apply a planned mutation
    ///
    /// The row insert, the row deletions and the high-water mark update are
    /// applied in one transaction. If the stored high-water mark differs from
    /// `mutation.expected_last()` nothing is written and an error is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails; durable state is then unchanged.
    async fn commit(&self, key: &ChainKey, mutation: &ChainMutation) -> Result<()>;

    /// Release the backend connection
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to shut down cleanly.
    async fn close(&self) -> Result<()>;

    /// Short backend name used in logs
    fn backend_name(&self) -> &str;
}

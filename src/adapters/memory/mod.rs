//! In-memory storage backend
//!
//! Mirrors chains in a process-local map with the same commit contract as
//! the PostgreSQL adapter. Used for tests and for embedding the store
//! without a database.

use crate::adapters::database::traits::{HistoryStorage, StoredChain};
use crate::core::chain::ChainMutation;
use crate::domain::{ChainKey, Result, SequenceNo, VaultError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// Process-local storage backend
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    chains: Mutex<HashMap<ChainKey, StoredChain>>,
    closed: AtomicBool,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(VaultError::PersistenceUnavailable(
                "in-memory storage has been closed".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl HistoryStorage for InMemoryStorage {
    async fn test_connection(&self) -> Result<()> {
        self.ensure_open()
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.ensure_open()
    }

    async fn load_chain(&self, key: &ChainKey) -> Result<Option<StoredChain>> {
        self.ensure_open()?;
        Ok(self.chains.lock().await.get(key).cloned())
    }

    async fn commit(&self, key: &ChainKey, mutation: &ChainMutation) -> Result<()> {
        self.ensure_open()?;

        let mut chains = self.chains.lock().await;
        let stored_last = chains
            .get(key)
            .map(|chain| chain.last_sequence)
            .unwrap_or(SequenceNo::ZERO);

        if stored_last != mutation.expected_last() {
            return Err(VaultError::PersistenceUnavailable(format!(
                "chain {key} was modified concurrently (expected sequence {}, found {stored_last})",
                mutation.expected_last()
            )));
        }

        // Build the new state aside so a rejected mutation leaves the map untouched.
        let mut next = chains.get(key).cloned().unwrap_or(StoredChain {
            entries: Vec::new(),
            last_sequence: SequenceNo::ZERO,
        });

        if let ChainMutation::Append { entry, .. } = mutation {
            next.entries.push(entry.clone());
        }
        let removed = mutation.removed();
        next.entries
            .retain(|entry| !removed.contains(&entry.sequence_no));
        next.last_sequence = mutation.resulting_last();

        chains.insert(key.clone(), next);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

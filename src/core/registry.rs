//! Patient registry
//!
//! Owns every patient's two version chains and keeps them in step with the
//! storage backend. Each (patient, kind) chain lives in its own [`ChainSlot`]:
//!
//! - a writer lock, held by push and rollback for the whole storage commit
//! - a snapshot cell, swapped only after storage has committed
//!
//! Readers clone the snapshot `Arc` under a short read lock, so they see the
//! chain before or after a mutation but never in between. Chains that are not
//! yet in memory are rehydrated from storage on first access.

use crate::adapters::database::HistoryStorage;
use crate::core::chain::{HistoryLimit, PlannedChange, VersionChain, VersionEntry};
use crate::domain::{ChainKey, DocumentKind, DocumentPayload, PatientId, Result, VaultError};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

/// Result of resolving a chain
#[derive(Debug, Clone)]
pub enum ChainLookup {
    /// The chain exists in memory or in storage
    Found(Arc<VersionChain>),
    /// Nothing has ever been written for this (patient, kind)
    Absent,
}

/// One chain's locks
#[derive(Debug, Default)]
struct ChainSlot {
    writer: Mutex<()>,
    /// `None` until loaded, and again after a failed commit
    snapshot: RwLock<Option<ChainLookup>>,
}

impl ChainSlot {
    fn cached(&self) -> Option<ChainLookup> {
        self.snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn install(&self, lookup: ChainLookup) {
        *self.snapshot.write().unwrap_or_else(|e| e.into_inner()) = Some(lookup);
    }

    fn invalidate(&self) {
        *self.snapshot.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

/// Both chains of one patient
#[derive(Debug, Default)]
struct PatientRecord {
    dhp: ChainSlot,
    plan_status: ChainSlot,
}

impl PatientRecord {
    fn slot(&self, kind: DocumentKind) -> &ChainSlot {
        match kind {
            DocumentKind::Dhp => &self.dhp,
            DocumentKind::PlanStatus => &self.plan_status,
        }
    }
}

/// In-memory owner of all patient records
pub struct PatientRegistry {
    records: RwLock<HashMap<PatientId, Arc<PatientRecord>>>,
    storage: Arc<dyn HistoryStorage + Send + Sync>,
    history_limit: HistoryLimit,
}

impl PatientRegistry {
    pub fn new(storage: Arc<dyn HistoryStorage + Send + Sync>, history_limit: HistoryLimit) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            storage,
            history_limit,
        }
    }

    pub fn history_limit(&self) -> HistoryLimit {
        self.history_limit
    }

    pub fn storage(&self) -> &Arc<dyn HistoryStorage + Send + Sync> {
        &self.storage
    }

    /// Number of patients with a record in memory
    pub fn patient_count(&self) -> usize {
        self.records.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Resolves a chain, rehydrating it from storage if needed
    ///
    /// # Errors
    ///
    /// Returns `VaultError::PersistenceUnavailable` if the chain must be
    /// loaded and storage fails
    pub async fn lookup(&self, patient_id: &PatientId, kind: DocumentKind) -> Result<ChainLookup> {
        let record = self.record(patient_id);
        let slot = record.slot(kind);

        if let Some(lookup) = slot.cached() {
            return Ok(lookup);
        }

        // Loads must not race a commit installing its snapshot
        let _writer = slot.writer.lock().await;
        self.resolve_locked(slot, &ChainKey::new(patient_id.clone(), kind))
            .await
    }

    /// Returns the chain, or a new empty one if nothing was ever written
    ///
    /// The empty chain is not installed; a chain comes into being with its
    /// first committed push.
    pub async fn get_or_create(
        &self,
        patient_id: &PatientId,
        kind: DocumentKind,
    ) -> Result<Arc<VersionChain>> {
        Ok(match self.lookup(patient_id, kind).await? {
            ChainLookup::Found(chain) => chain,
            ChainLookup::Absent => Arc::new(VersionChain::new(self.history_limit)),
        })
    }

    /// Appends a payload to a chain and mirrors it to storage
    ///
    /// # Errors
    ///
    /// Returns `VaultError::PersistenceUnavailable` if the commit fails; the
    /// chain is then unchanged.
    pub async fn push(
        &self,
        patient_id: &PatientId,
        kind: DocumentKind,
        payload: DocumentPayload,
    ) -> Result<VersionEntry> {
        let key = ChainKey::new(patient_id.clone(), kind);
        let record = self.record(patient_id);
        let slot = record.slot(kind);

        let _writer = slot.writer.lock().await;
        let chain = self.base_chain(slot, &key).await?;
        let planned = chain.plan_push(payload);

        let evicted = planned.mutation.removed().len();
        let head = self.commit(slot, &key, planned).await?;
        crate::log_chain_push!(&key, head.sequence_no, evicted);

        Ok(head)
    }

    /// Returns the newest entry of a chain
    ///
    /// # Errors
    ///
    /// Returns `VaultError::PatientNotFound` if the chain was never written
    pub async fn current(&self, patient_id: &PatientId, kind: DocumentKind) -> Result<VersionEntry> {
        let key = ChainKey::new(patient_id.clone(), kind);
        match self.lookup(patient_id, kind).await? {
            ChainLookup::Found(chain) => chain
                .current()
                .cloned()
                .map_err(|e| not_found_if_empty(e, &key)),
            ChainLookup::Absent => Err(not_found(&key)),
        }
    }

    /// Discards the `steps` newest entries and returns the new head
    ///
    /// # Errors
    ///
    /// - `VaultError::InvalidSteps` if `steps` is zero
    /// - `VaultError::PatientNotFound` if the chain was never written
    /// - `VaultError::InsufficientHistory` if `steps` reaches the oldest entry
    /// - `VaultError::PersistenceUnavailable` if the commit fails
    pub async fn rollback(
        &self,
        patient_id: &PatientId,
        kind: DocumentKind,
        steps: usize,
    ) -> Result<VersionEntry> {
        let key = ChainKey::new(patient_id.clone(), kind);
        let record = self.record(patient_id);
        let slot = record.slot(kind);

        let _writer = slot.writer.lock().await;
        let chain = self.base_chain(slot, &key).await?;
        let planned = chain
            .plan_rollback(steps)
            .map_err(|e| not_found_if_empty(e, &key))?;

        let head = self.commit(slot, &key, planned).await?;
        crate::log_chain_rollback!(&key, steps, head.sequence_no);

        Ok(head)
    }

    /// Lists the retained entries of a chain, oldest first
    ///
    /// # Errors
    ///
    /// Returns `VaultError::PatientNotFound` if the chain was never written
    pub async fn history(
        &self,
        patient_id: &PatientId,
        kind: DocumentKind,
    ) -> Result<Vec<VersionEntry>> {
        let key = ChainKey::new(patient_id.clone(), kind);
        match self.lookup(patient_id, kind).await? {
            ChainLookup::Found(chain) if !chain.is_empty() => Ok(chain.entries().cloned().collect()),
            _ => Err(not_found(&key)),
        }
    }

    fn record(&self, patient_id: &PatientId) -> Arc<PatientRecord> {
        if let Some(record) = self
            .records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(patient_id)
        {
            return Arc::clone(record);
        }

        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(records.entry(patient_id.clone()).or_default())
    }

    /// Caller must hold `slot.writer`
    async fn resolve_locked(&self, slot: &ChainSlot, key: &ChainKey) -> Result<ChainLookup> {
        if let Some(lookup) = slot.cached() {
            return Ok(lookup);
        }

        let lookup = match self.storage.load_chain(key).await? {
            Some(stored) => {
                let chain =
                    VersionChain::restore(self.history_limit, stored.entries, stored.last_sequence)?;
                tracing::debug!(
                    patient_id = %key.patient_id,
                    kind = %key.kind,
                    entries = chain.len(),
                    backend = self.storage.backend_name(),
                    "Chain rehydrated from storage"
                );
                ChainLookup::Found(Arc::new(chain))
            }
            None => ChainLookup::Absent,
        };

        slot.install(lookup.clone());
        Ok(lookup)
    }

    /// Caller must hold `slot.writer`
    async fn base_chain(&self, slot: &ChainSlot, key: &ChainKey) -> Result<Arc<VersionChain>> {
        Ok(match self.resolve_locked(slot, key).await? {
            ChainLookup::Found(chain) => chain,
            ChainLookup::Absent => Arc::new(VersionChain::new(self.history_limit)),
        })
    }

    /// Caller must hold `slot.writer`
    async fn commit(
        &self,
        slot: &ChainSlot,
        key: &ChainKey,
        planned: PlannedChange,
    ) -> Result<VersionEntry> {
        if let Err(e) = self.storage.commit(key, &planned.mutation).await {
            // The outcome of a failed commit is unknown; reload on next access.
            slot.invalidate();
            tracing::warn!(
                patient_id = %key.patient_id,
                kind = %key.kind,
                error = %e,
                "Commit failed; chain will be reloaded from storage"
            );
            return Err(e);
        }

        slot.install(ChainLookup::Found(Arc::new(planned.chain)));
        Ok(planned.head)
    }
}

fn not_found(key: &ChainKey) -> VaultError {
    VaultError::PatientNotFound {
        patient_id: key.patient_id.to_string(),
        kind: key.kind.to_string(),
    }
}

fn not_found_if_empty(err: VaultError, key: &ChainKey) -> VaultError {
    match err {
        VaultError::EmptyChain => not_found(key),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::database::StoredChain;
    use crate::adapters::memory::InMemoryStorage;
    use crate::core::chain::ChainMutation;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn payload(n: u64) -> DocumentPayload {
        DocumentPayload::try_from(json!({ "n": n })).unwrap()
    }

    fn patient() -> PatientId {
        PatientId::new("P1").unwrap()
    }

    fn registry(limit: usize) -> PatientRegistry {
        PatientRegistry::new(
            Arc::new(InMemoryStorage::new()),
            HistoryLimit::new(limit).unwrap(),
        )
    }

    /// Delegates to memory storage but fails commits on demand
    #[derive(Default)]
    struct FlakyStorage {
        inner: InMemoryStorage,
        fail_commits: AtomicBool,
    }

    #[async_trait]
    impl HistoryStorage for FlakyStorage {
        async fn test_connection(&self) -> Result<()> {
            self.inner.test_connection().await
        }

        async fn ensure_schema(&self) -> Result<()> {
            self.inner.ensure_schema().await
        }

        async fn load_chain(&self, key: &ChainKey) -> Result<Option<StoredChain>> {
            self.inner.load_chain(key).await
        }

        async fn commit(&self, key: &ChainKey, mutation: &ChainMutation) -> Result<()> {
            if self.fail_commits.load(Ordering::SeqCst) {
                return Err(VaultError::PersistenceUnavailable("injected".to_string()));
            }
            self.inner.commit(key, mutation).await
        }

        async fn close(&self) -> Result<()> {
            self.inner.close().await
        }

        fn backend_name(&self) -> &str {
            "flaky"
        }
    }

    #[tokio::test]
    async fn test_current_on_unknown_patient() {
        let registry = registry(10);
        let err = registry.current(&patient(), DocumentKind::Dhp).await.unwrap_err();
        assert!(matches!(err, VaultError::PatientNotFound { .. }));
    }

    #[tokio::test]
    async fn test_get_or_create_does_not_materialize() {
        let registry = registry(10);
        let chain = registry
            .get_or_create(&patient(), DocumentKind::Dhp)
            .await
            .unwrap();
        assert!(chain.is_empty());

        assert!(matches!(
            registry.lookup(&patient(), DocumentKind::Dhp).await.unwrap(),
            ChainLookup::Absent
        ));
    }

    #[tokio::test]
    async fn test_kinds_are_independent() {
        let registry = registry(10);
        registry
            .push(&patient(), DocumentKind::Dhp, payload(1))
            .await
            .unwrap();

        assert!(registry.current(&patient(), DocumentKind::Dhp).await.is_ok());
        assert!(matches!(
            registry.current(&patient(), DocumentKind::PlanStatus).await,
            Err(VaultError::PatientNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_rollback_error_precedence() {
        let registry = registry(10);

        assert!(matches!(
            registry.rollback(&patient(), DocumentKind::Dhp, 0).await,
            Err(VaultError::InvalidSteps(0))
        ));
        assert!(matches!(
            registry.rollback(&patient(), DocumentKind::Dhp, 1).await,
            Err(VaultError::PatientNotFound { .. })
        ));

        registry
            .push(&patient(), DocumentKind::Dhp, payload(1))
            .await
            .unwrap();
        assert!(matches!(
            registry.rollback(&patient(), DocumentKind::Dhp, 1).await,
            Err(VaultError::InsufficientHistory { steps: 1, retained: 1 })
        ));
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_chain_unchanged() {
        let storage = Arc::new(FlakyStorage::default());
        let registry = PatientRegistry::new(storage.clone(), HistoryLimit::default());

        registry
            .push(&patient(), DocumentKind::PlanStatus, payload(1))
            .await
            .unwrap();
        let before = registry
            .history(&patient(), DocumentKind::PlanStatus)
            .await
            .unwrap();

        storage.fail_commits.store(true, Ordering::SeqCst);
        let err = registry
            .push(&patient(), DocumentKind::PlanStatus, payload(2))
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::PersistenceUnavailable(_)));
        storage.fail_commits.store(false, Ordering::SeqCst);

        let after = registry
            .history(&patient(), DocumentKind::PlanStatus)
            .await
            .unwrap();
        assert_eq!(before, after);

        let next = registry
            .push(&patient(), DocumentKind::PlanStatus, payload(3))
            .await
            .unwrap();
        assert_eq!(next.sequence_no.value(), 2);
    }

    #[tokio::test]
    async fn test_history_is_oldest_first() {
        let registry = registry(3);
        for n in 1..=5 {
            registry
                .push(&patient(), DocumentKind::Dhp, payload(n))
                .await
                .unwrap();
        }

        let numbers: Vec<u64> = registry
            .history(&patient(), DocumentKind::Dhp)
            .await
            .unwrap()
            .iter()
            .map(|e| e.sequence_no.value())
            .collect();
        assert_eq!(numbers, vec![3, 4, 5]);
        assert_eq!(registry.patient_count(), 1);
    }
}

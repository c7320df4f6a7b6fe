//! Vault store facade
//!
//! [`VaultStore`] is the public entry point: it owns the registry and the
//! storage backend, exposes the push/read/rollback/export operations, and
//! tracks whether the store has been closed.

use crate::adapters::database::{create_history_storage, HistoryStorage};
use crate::config::VaultConfig;
use crate::core::chain::{HistoryLimit, VersionEntry};
use crate::core::export::JsonExporter;
use crate::core::registry::PatientRegistry;
use crate::domain::{DocumentKind, DocumentPayload, PatientId, Result, VaultError};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Bounded-history store for patient documents
///
/// # Example
///
/// ```rust
/// use dhp_vault::adapters::memory::InMemoryStorage;
/// use dhp_vault::core::{HistoryLimit, VaultStore};
/// use dhp_vault::domain::{DocumentKind, DocumentPayload, PatientId};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = VaultStore::with_storage(Arc::new(InMemoryStorage::new()), HistoryLimit::new(10)?);
/// let patient = PatientId::new("P1")?;
///
/// store.push(DocumentKind::PlanStatus, &patient, DocumentPayload::try_from(json!({"step": 1}))?).await?;
/// store.push(DocumentKind::PlanStatus, &patient, DocumentPayload::try_from(json!({"step": 2}))?).await?;
///
/// let head = store.rollback(DocumentKind::PlanStatus, &patient, 1).await?;
/// assert_eq!(head.payload.get("step"), Some(&json!(1)));
///
/// store.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct VaultStore {
    registry: PatientRegistry,
    closed: AtomicBool,
}

impl VaultStore {
    /// Open a store using the configured backend
    ///
    /// Builds the backend, makes sure its schema exists, and fixes the
    /// history limit for the lifetime of the store.
    ///
    /// # Errors
    ///
    /// - `VaultError::Configuration` if the configuration is unusable
    /// - `VaultError::PersistenceUnavailable` if the backend cannot be reached
    pub async fn open(config: &VaultConfig) -> Result<Self> {
        let history_limit = HistoryLimit::new(config.store.history_limit)?;
        let storage = create_history_storage(config).await?;
        storage.ensure_schema().await?;

        tracing::info!(
            backend = storage.backend_name(),
            history_limit = history_limit.get(),
            "Vault store opened"
        );

        Ok(Self::with_storage(storage, history_limit))
    }

    /// Build a store over an existing backend
    pub fn with_storage(
        storage: Arc<dyn HistoryStorage + Send + Sync>,
        history_limit: HistoryLimit,
    ) -> Self {
        Self {
            registry: PatientRegistry::new(storage, history_limit),
            closed: AtomicBool::new(false),
        }
    }

    pub fn history_limit(&self) -> HistoryLimit {
        self.registry.history_limit()
    }

    pub fn backend_name(&self) -> &str {
        self.registry.storage().backend_name()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Push a new version of a patient's document
    ///
    /// # Errors
    ///
    /// - `VaultError::StoreClosed` after [`VaultStore::close`]
    /// - `VaultError::PersistenceUnavailable` if the commit fails
    pub async fn push(
        &self,
        kind: DocumentKind,
        patient_id: &PatientId,
        payload: DocumentPayload,
    ) -> Result<VersionEntry> {
        self.ensure_open()?;
        self.registry.push(patient_id, kind, payload).await
    }

    /// Push a DHP document, taking the patient from `hard["Patient Alias"]`
    ///
    /// # Errors
    ///
    /// Returns `VaultError::InvalidPayload` if the alias is missing, plus the
    /// errors of [`VaultStore::push`]
    pub async fn push_dhp(&self, payload: DocumentPayload) -> Result<VersionEntry> {
        self.ensure_open()?;
        let patient_id = payload.dhp_patient_alias()?;
        self.registry
            .push(&patient_id, DocumentKind::Dhp, payload)
            .await
    }

    /// Current version of a patient's document
    ///
    /// # Errors
    ///
    /// Returns `VaultError::PatientNotFound` if nothing was pushed for `kind`
    pub async fn current(&self, kind: DocumentKind, patient_id: &PatientId) -> Result<VersionEntry> {
        self.ensure_open()?;
        self.registry.current(patient_id, kind).await
    }

    /// Roll a document back by `steps` versions
    ///
    /// Discarded versions are deleted and cannot be restored.
    ///
    /// # Errors
    ///
    /// - `VaultError::InvalidSteps` if `steps` is zero
    /// - `VaultError::PatientNotFound` if nothing was pushed for `kind`
    /// - `VaultError::InsufficientHistory` if fewer than `steps + 1` versions are retained
    pub async fn rollback(
        &self,
        kind: DocumentKind,
        patient_id: &PatientId,
        steps: usize,
    ) -> Result<VersionEntry> {
        self.ensure_open()?;
        self.registry.rollback(patient_id, kind, steps).await
    }

    /// Retained versions of a document, oldest first
    ///
    /// # Errors
    ///
    /// Returns `VaultError::PatientNotFound` if nothing was pushed for `kind`
    pub async fn history(
        &self,
        kind: DocumentKind,
        patient_id: &PatientId,
    ) -> Result<Vec<VersionEntry>> {
        self.ensure_open()?;
        self.registry.history(patient_id, kind).await
    }

    /// Write the current version of a document to `destination` as JSON
    ///
    /// # Errors
    ///
    /// - `VaultError::PatientNotFound` if nothing was pushed for `kind`
    /// - `VaultError::DestinationUnwritable` if the file cannot be written
    pub async fn export(
        &self,
        kind: DocumentKind,
        patient_id: &PatientId,
        destination: impl AsRef<Path>,
    ) -> Result<()> {
        self.ensure_open()?;
        JsonExporter::new(&self.registry)
            .export(patient_id, kind, destination.as_ref())
            .await
    }

    /// Release the backend
    ///
    /// Closing twice is a no-op. Every other operation fails with
    /// `VaultError::StoreClosed` afterwards.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        self.registry.storage().close().await?;
        tracing::info!(backend = self.backend_name(), "Vault store closed");
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(VaultError::StoreClosed);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStorage;
    use crate::config::{DatabaseTarget, VaultConfig};
    use serde_json::json;

    fn store() -> VaultStore {
        VaultStore::with_storage(Arc::new(InMemoryStorage::new()), HistoryLimit::default())
    }

    #[tokio::test]
    async fn test_open_memory_backend() {
        let config = VaultConfig {
            application: Default::default(),
            database_target: DatabaseTarget::Memory,
            store: Default::default(),
            postgresql: None,
            logging: Default::default(),
        };

        let store = VaultStore::open(&config).await.unwrap();
        assert_eq!(store.backend_name(), "memory");
        assert_eq!(store.history_limit().get(), 10);
    }

    #[tokio::test]
    async fn test_push_dhp_uses_patient_alias() {
        let store = store();
        let document = json!({"hard": {"Patient Alias": "alias-7"}, "soft": {}});

        let entry = store
            .push_dhp(DocumentPayload::try_from(document).unwrap())
            .await
            .unwrap();
        assert_eq!(entry.sequence_no.value(), 1);

        let patient = PatientId::new("alias-7").unwrap();
        assert_eq!(store.current(DocumentKind::Dhp, &patient).await.unwrap(), entry);
    }

    #[tokio::test]
    async fn test_push_dhp_without_alias() {
        let store = store();
        let err = store
            .push_dhp(DocumentPayload::try_from(json!({"hard": {}})).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let store = store();
        store.close().await.unwrap();
        store.close().await.unwrap();
        assert!(store.is_closed());

        let patient = PatientId::new("P1").unwrap();
        assert!(matches!(
            store.current(DocumentKind::Dhp, &patient).await,
            Err(VaultError::StoreClosed)
        ));
    }
}

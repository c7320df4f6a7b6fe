//! PostgreSQL adapter implementing the storage trait
//!
//! Every mutation runs in a single transaction that first locks the chain's
//! `version_chains` row, so writers in other processes are serialised too.

use crate::adapters::database::traits::{HistoryStorage, StoredChain};
use crate::adapters::postgresql::client::{unavailable, PostgreSQLClient};
use crate::adapters::postgresql::models::{PostgreSQLChainRow, PostgreSQLVersionRow};
use crate::core::chain::ChainMutation;
use crate::domain::{ChainKey, Result, SequenceNo, VaultError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_postgres::IsolationLevel;

const SELECT_CHAIN: &str = r#"
    SELECT last_sequence_no
    FROM version_chains
    WHERE patient_id = $1 AND document_kind = $2
"#;

const SELECT_VERSIONS: &str = r#"
    SELECT sequence_no, payload, created_at
    FROM patient_document_versions
    WHERE patient_id = $1 AND document_kind = $2
    ORDER BY sequence_no ASC
"#;

const ENSURE_CHAIN_ROW: &str = r#"
    INSERT INTO version_chains (patient_id, document_kind)
    VALUES ($1, $2)
    ON CONFLICT (patient_id, document_kind) DO NOTHING
"#;

const LOCK_CHAIN_ROW: &str = r#"
    SELECT last_sequence_no
    FROM version_chains
    WHERE patient_id = $1 AND document_kind = $2
    FOR UPDATE
"#;

const INSERT_VERSION: &str = r#"
    INSERT INTO patient_document_versions (
        patient_id, document_kind, sequence_no, payload, created_at
    )
    VALUES ($1, $2, $3, $4, $5)
"#;

const DELETE_VERSIONS: &str = r#"
    DELETE FROM patient_document_versions
    WHERE patient_id = $1 AND document_kind = $2 AND sequence_no = ANY($3)
"#;

const UPDATE_CHAIN_ROW: &str = r#"
    UPDATE version_chains
    SET last_sequence_no = $3, updated_at = now()
    WHERE patient_id = $1 AND document_kind = $2
"#;

/// PostgreSQL implementation of [`HistoryStorage`]
pub struct PostgreSQLAdapter {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLAdapter {
    /// Create a new PostgreSQL adapter
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

#[async_trait]
impl HistoryStorage for PostgreSQLAdapter {
    async fn test_connection(&self) -> Result<()> {
        self.client.test_connection().await
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.client.ensure_schema().await
    }

    async fn load_chain(&self, key: &ChainKey) -> Result<Option<StoredChain>> {
        let patient_id = key.patient_id.as_str();
        let kind = key.kind.as_str();

        tracing::debug!(
            patient_id = %patient_id,
            kind = %kind,
            "Loading chain from PostgreSQL"
        );

        let mut conn = self.client.get_connection().await?;

        // Both reads must see the same snapshot
        let tx = conn
            .build_transaction()
            .isolation_level(IsolationLevel::RepeatableRead)
            .read_only(true)
            .start()
            .await
            .map_err(|e| unavailable("Failed to start read transaction", e))?;

        tx.batch_execute(&self.client.statement_timeout_sql())
            .await
            .map_err(|e| unavailable("Failed to set statement timeout", e))?;

        let chain_rows = tx
            .query(SELECT_CHAIN, &[&patient_id, &kind])
            .await
            .map_err(|e| unavailable("Failed to read chain", e))?;

        let version_rows = tx
            .query(SELECT_VERSIONS, &[&patient_id, &kind])
            .await
            .map_err(|e| unavailable("Failed to read versions", e))?;

        tx.commit()
            .await
            .map_err(|e| unavailable("Failed to finish read transaction", e))?;

        if chain_rows.is_empty() && version_rows.is_empty() {
            tracing::debug!(
                patient_id = %patient_id,
                kind = %kind,
                "No chain found in PostgreSQL"
            );
            return Ok(None);
        }

        let last_sequence = match chain_rows.first() {
            Some(row) => PostgreSQLChainRow::from_row(key, row).last_sequence()?,
            None => SequenceNo::ZERO,
        };

        let entries = version_rows
            .iter()
            .map(|row| PostgreSQLVersionRow::from_row(key, row).to_domain())
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            patient_id = %patient_id,
            kind = %kind,
            entries = entries.len(),
            last_sequence = %last_sequence,
            "Chain loaded from PostgreSQL"
        );

        Ok(Some(StoredChain {
            entries,
            last_sequence,
        }))
    }

    async fn commit(&self, key: &ChainKey, mutation: &ChainMutation) -> Result<()> {
        let patient_id = key.patient_id.as_str();
        let kind = key.kind.as_str();

        let mut conn = self.client.get_connection().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| unavailable("Failed to start transaction", e))?;

        tx.batch_execute(&self.client.statement_timeout_sql())
            .await
            .map_err(|e| unavailable("Failed to set statement timeout", e))?;

        tx.execute(ENSURE_CHAIN_ROW, &[&patient_id, &kind])
            .await
            .map_err(|e| unavailable("Failed to create chain row", e))?;

        let locked = tx
            .query_one(LOCK_CHAIN_ROW, &[&patient_id, &kind])
            .await
            .map_err(|e| unavailable("Failed to lock chain row", e))?;

        // Dropping `tx` on any early return below rolls the transaction back.
        let stored_last = PostgreSQLChainRow::from_row(key, &locked).last_sequence()?;
        if stored_last != mutation.expected_last() {
            return Err(VaultError::PersistenceUnavailable(format!(
                "chain {key} was modified concurrently (expected sequence {}, found {stored_last})",
                mutation.expected_last()
            )));
        }

        if let ChainMutation::Append { entry, .. } = mutation {
            let row = PostgreSQLVersionRow::from_domain(key, entry);
            tx.execute(
                INSERT_VERSION,
                &[
                    &row.patient_id,
                    &row.document_kind,
                    &row.sequence_no,
                    &row.payload,
                    &row.created_at,
                ],
            )
            .await
            .map_err(|e| unavailable("Failed to insert version", e))?;
        }

        let removed: Vec<i64> = mutation.removed().iter().map(SequenceNo::to_db).collect();
        if !removed.is_empty() {
            let deleted = tx
                .execute(DELETE_VERSIONS, &[&patient_id, &kind, &removed])
                .await
                .map_err(|e| unavailable("Failed to delete versions", e))?;

            if deleted != removed.len() as u64 {
                return Err(VaultError::PersistenceUnavailable(format!(
                    "chain {key} out of sync: expected to delete {} row(s), deleted {deleted}",
                    removed.len()
                )));
            }
        }

        let resulting_last = mutation.resulting_last().to_db();
        tx.execute(UPDATE_CHAIN_ROW, &[&patient_id, &kind, &resulting_last])
            .await
            .map_err(|e| unavailable("Failed to update chain row", e))?;

        tx.commit()
            .await
            .map_err(|e| unavailable("Failed to commit transaction", e))?;

        tracing::debug!(
            patient_id = %patient_id,
            kind = %kind,
            last_sequence = resulting_last,
            removed = removed.len(),
            "Chain mutation committed to PostgreSQL"
        );

        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.client.close();
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "postgresql"
    }
}

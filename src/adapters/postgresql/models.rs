//! PostgreSQL row models
//!
//! Row structures for the `patient_document_versions` and `version_chains`
//! tables, with conversions to and from domain types.

use crate::core::chain::VersionEntry;
use crate::domain::{ChainKey, DocumentPayload, Result, SequenceNo};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio_postgres::Row;

/// One retained version
///
/// This structure maps to the `patient_document_versions` table.
#[derive(Debug, Clone)]
pub struct PostgreSQLVersionRow {
    /// Patient identifier
    pub patient_id: String,

    /// Document kind tag ('dhp' or 'plan_status')
    pub document_kind: String,

    /// Sequence number within the chain
    pub sequence_no: i64,

    /// Document payload in JSONB format
    pub payload: Value,

    /// When the version was pushed
    pub created_at: DateTime<Utc>,
}

impl PostgreSQLVersionRow {
    /// Build the row for an entry of the given chain
    pub fn from_domain(key: &ChainKey, entry: &VersionEntry) -> Self {
        Self {
            patient_id: key.patient_id.as_str().to_string(),
            document_kind: key.kind.as_str().to_string(),
            sequence_no: entry.sequence_no.to_db(),
            payload: entry.payload.to_value(),
            created_at: entry.created_at,
        }
    }

    /// Read a row selected with `sequence_no, payload, created_at`
    pub fn from_row(key: &ChainKey, row: &Row) -> Self {
        Self {
            patient_id: key.patient_id.as_str().to_string(),
            document_kind: key.kind.as_str().to_string(),
            sequence_no: row.get("sequence_no"),
            payload: row.get("payload"),
            created_at: row.get("created_at"),
        }
    }

    /// Convert back to a domain entry
    ///
    /// # Errors
    ///
    /// Returns an error if the stored payload is not an object or the
    /// sequence number is negative
    pub fn to_domain(self) -> Result<VersionEntry> {
        Ok(VersionEntry {
            sequence_no: SequenceNo::from_db(self.sequence_no)?,
            payload: DocumentPayload::try_from(self.payload)?,
            created_at: self.created_at,
        })
    }
}

/// Sequence high-water mark of one chain
///
/// This structure maps to the `version_chains` table.
#[derive(Debug, Clone)]
pub struct PostgreSQLChainRow {
    pub patient_id: String,
    pub document_kind: String,
    pub last_sequence_no: i64,
}

impl PostgreSQLChainRow {
    pub fn from_row(key: &ChainKey, row: &Row) -> Self {
        Self {
            patient_id: key.patient_id.as_str().to_string(),
            document_kind: key.kind.as_str().to_string(),
            last_sequence_no: row.get("last_sequence_no"),
        }
    }

    pub fn last_sequence(&self) -> Result<SequenceNo> {
        SequenceNo::from_db(self.last_sequence_no)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DocumentKind, PatientId, VaultError};
    use serde_json::json;

    fn key() -> ChainKey {
        ChainKey::new(PatientId::new("P1").unwrap(), DocumentKind::PlanStatus)
    }

    #[test]
    fn test_version_row_from_domain() {
        let entry = VersionEntry::new(
            SequenceNo::new(4),
            DocumentPayload::try_from(json!({"status": "active"})).unwrap(),
        );

        let row = PostgreSQLVersionRow::from_domain(&key(), &entry);
        assert_eq!(row.patient_id, "P1");
        assert_eq!(row.document_kind, "plan_status");
        assert_eq!(row.sequence_no, 4);
        assert_eq!(row.payload, json!({"status": "active"}));

        assert_eq!(row.to_domain().unwrap(), entry);
    }

    #[test]
    fn test_version_row_rejects_non_object_payload() {
        let row = PostgreSQLVersionRow {
            patient_id: "P1".to_string(),
            document_kind: "dhp".to_string(),
            sequence_no: 1,
            payload: json!("not an object"),
            created_at: Utc::now(),
        };
        assert!(matches!(row.to_domain(), Err(VaultError::InvalidPayload(_))));
    }

    #[test]
    fn test_chain_row_negative_sequence() {
        let row = PostgreSQLChainRow {
            patient_id: "P1".to_string(),
            document_kind: "dhp".to_string(),
            last_sequence_no: -3,
        };
        assert!(row.last_sequence().is_err());
    }
}

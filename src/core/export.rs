//! JSON export sink
//!
//! Writes the head of a chain to a file as pretty-printed JSON. The export
//! only reads through the registry and never mutates a chain.

use crate::core::registry::PatientRegistry;
use crate::domain::{DocumentKind, PatientId, Result, VaultError};
use std::path::Path;

/// Writes current payloads to JSON files
pub struct JsonExporter<'a> {
    registry: &'a PatientRegistry,
}

impl<'a> JsonExporter<'a> {
    pub fn new(registry: &'a PatientRegistry) -> Self {
        Self { registry }
    }

    /// Export the current payload of a chain to `destination`
    ///
    /// Missing parent directories are created and existing content is
    /// overwritten. The payload is written verbatim; key order is not kept.
    ///
    /// # Errors
    ///
    /// - `VaultError::PatientNotFound` if the chain was never written
    /// - `VaultError::DestinationUnwritable` if the file cannot be written
    pub async fn export(
        &self,
        patient_id: &PatientId,
        kind: DocumentKind,
        destination: &Path,
    ) -> Result<()> {
        let entry = self.registry.current(patient_id, kind).await?;

        let json = serde_json::to_string_pretty(&entry.payload)
            .map_err(|e| unwritable(destination, e))?;

        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| unwritable(destination, e))?;
            }
        }

        tokio::fs::write(destination, json)
            .await
            .map_err(|e| unwritable(destination, e))?;

        tracing::info!(
            patient_id = %patient_id,
            kind = %kind,
            sequence_no = %entry.sequence_no,
            destination = %destination.display(),
            "Current version exported"
        );

        Ok(())
    }
}

fn unwritable(destination: &Path, reason: impl std::fmt::Display) -> VaultError {
    VaultError::DestinationUnwritable {
        path: destination.display().to_string(),
        reason: reason.to_string(),
    }
}

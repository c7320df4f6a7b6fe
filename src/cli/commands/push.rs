//! Push command implementation

use super::{open_store, report_failure};
use crate::domain::{DocumentKind, DocumentPayload, PatientId};
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the push command
#[derive(Args, Debug)]
pub struct PushArgs {
    /// Document kind (dhp, plan-status)
    #[arg(short, long)]
    pub kind: DocumentKind,

    /// Patient identifier; optional for DHP documents, which carry their own alias
    #[arg(short, long)]
    pub patient: Option<PatientId>,

    /// JSON file holding the document
    #[arg(short, long)]
    pub file: PathBuf,
}

impl PushArgs {
    /// Execute the push command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let text = tokio::fs::read_to_string(&self.file)
            .await
            .with_context(|| format!("Failed to read {}", self.file.display()))?;

        let payload = match DocumentPayload::from_json_str(&text) {
            Ok(payload) => payload,
            Err(e) => return Ok(report_failure("Document rejected", &e)),
        };

        let store = match open_store(config_path).await {
            Ok(store) => store,
            Err(code) => return Ok(code),
        };

        let result = match (&self.patient, self.kind) {
            (Some(patient), kind) => store.push(kind, patient, payload).await,
            (None, DocumentKind::Dhp) => store.push_dhp(payload).await,
            (None, DocumentKind::PlanStatus) => {
                println!("❌ --patient is required for plan-status documents");
                store.close().await?;
                return Ok(3);
            }
        };

        let code = match result {
            Ok(entry) => {
                println!(
                    "✅ Pushed {} version {} at {}",
                    self.kind,
                    entry.sequence_no,
                    entry.created_at.to_rfc3339()
                );
                0
            }
            Err(e) => report_failure("Push failed", &e),
        };

        store.close().await?;
        Ok(code)
    }
}

//! Export command implementation

use super::{open_store, report_failure, ChainArgs};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub chain: ChainArgs,

    /// Destination JSON file; existing content is overwritten
    #[arg(short, long)]
    pub output: PathBuf,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let store = match open_store(config_path).await {
            Ok(store) => store,
            Err(code) => return Ok(code),
        };

        let code = match store
            .export(self.chain.kind, &self.chain.patient, &self.output)
            .await
        {
            Ok(()) => {
                println!(
                    "📤 Exported {} for {} to {}",
                    self.chain.kind,
                    self.chain.patient,
                    self.output.display()
                );
                0
            }
            Err(e) => report_failure("Export failed", &e),
        };

        store.close().await?;
        Ok(code)
    }
}

//! Show command implementation

use super::{open_store, report_failure, ChainArgs};
use clap::Args;

/// Arguments for the show command
#[derive(Args, Debug)]
pub struct ShowArgs {
    #[command(flatten)]
    pub chain: ChainArgs,
}

impl ShowArgs {
    /// Execute the show command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let store = match open_store(config_path).await {
            Ok(store) => store,
            Err(code) => return Ok(code),
        };

        let code = match store.current(self.chain.kind, &self.chain.patient).await {
            Ok(entry) => {
                println!(
                    "📄 {} for {} (version {}, {})",
                    self.chain.kind,
                    self.chain.patient,
                    entry.sequence_no,
                    entry.created_at.to_rfc3339()
                );
                println!("{}", serde_json::to_string_pretty(&entry.payload)?);
                0
            }
            Err(e) => report_failure("Lookup failed", &e),
        };

        store.close().await?;
        Ok(code)
    }
}

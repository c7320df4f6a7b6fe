//! History command implementation

use super::{open_store, report_failure, ChainArgs};
use clap::Args;

/// Arguments for the history command
#[derive(Args, Debug)]
pub struct HistoryArgs {
    #[command(flatten)]
    pub chain: ChainArgs,
}

impl HistoryArgs {
    /// Execute the history command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let store = match open_store(config_path).await {
            Ok(store) => store,
            Err(code) => return Ok(code),
        };

        let code = match store.history(self.chain.kind, &self.chain.patient).await {
            Ok(entries) => {
                println!(
                    "📜 {} history for {} ({} of {} retained)",
                    self.chain.kind,
                    self.chain.patient,
                    entries.len(),
                    store.history_limit().get()
                );
                println!();
                println!("{:<10} {:<35} {}", "Version", "Created", "Fields");
                println!("{}", "─".repeat(60));

                // Newest first reads more naturally on a terminal
                for entry in entries.iter().rev() {
                    println!(
                        "{:<10} {:<35} {}",
                        entry.sequence_no,
                        entry.created_at.to_rfc3339(),
                        entry.payload.as_map().len()
                    );
                }
                0
            }
            Err(e) => report_failure("Lookup failed", &e),
        };

        store.close().await?;
        Ok(code)
    }
}

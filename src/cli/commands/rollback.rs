//! Rollback command implementation

use super::{open_store, report_failure, ChainArgs};
use clap::Args;

/// Arguments for the rollback command
#[derive(Args, Debug)]
pub struct RollbackArgs {
    #[command(flatten)]
    pub chain: ChainArgs,

    /// Number of versions to discard
    #[arg(short, long, default_value_t = 1)]
    pub steps: usize,
}

impl RollbackArgs {
    /// Execute the rollback command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let store = match open_store(config_path).await {
            Ok(store) => store,
            Err(code) => return Ok(code),
        };

        let code = match store
            .rollback(self.chain.kind, &self.chain.patient, self.steps)
            .await
        {
            Ok(head) => {
                println!(
                    "⏪ Rolled back {} step(s); {} for {} is now version {}",
                    self.steps, self.chain.kind, self.chain.patient, head.sequence_no
                );
                0
            }
            Err(e) => report_failure("Rollback failed", &e),
        };

        store.close().await?;
        Ok(code)
    }
}

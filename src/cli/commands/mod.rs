//! CLI command implementations
//!
//! Every command returns its process exit code:
//!
//! - `0` - success
//! - `2` - configuration error
//! - `3` - domain error (unknown patient, invalid rollback, bad payload)
//! - `4` - backend unreachable
//! - `5` - fatal error

pub mod export;
pub mod history;
pub mod init_db;
pub mod push;
pub mod rollback;
pub mod show;
pub mod validate;

use crate::config::load_config;
use crate::core::VaultStore;
use crate::domain::{DocumentKind, PatientId, VaultError};
use clap::Args;

/// Selects one patient's chain
#[derive(Args, Debug, Clone)]
pub struct ChainArgs {
    /// Document kind (dhp, plan-status)
    #[arg(short, long)]
    pub kind: DocumentKind,

    /// Patient identifier
    #[arg(short, long)]
    pub patient: PatientId,
}

/// Exit code for a vault error
pub fn exit_code(err: &VaultError) -> i32 {
    match err {
        VaultError::Configuration(_) => 2,
        VaultError::PersistenceUnavailable(_) => 4,
        e if e.is_domain() => 3,
        _ => 5,
    }
}

/// Print a failure the way every command does and return its exit code
pub(crate) fn report_failure(context: &str, err: &VaultError) -> i32 {
    println!("❌ {context}");
    println!("   Error: {err}");
    exit_code(err)
}

/// Load the configuration and open the store
///
/// On failure the error has already been printed and the exit code is returned.
pub(crate) async fn open_store(config_path: &str) -> Result<VaultStore, i32> {
    let config = load_config(config_path)
        .map_err(|e| report_failure("Failed to load configuration file", &e))?;

    VaultStore::open(&config)
        .await
        .map_err(|e| report_failure("Failed to open vault store", &e))
}

//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Console output with configurable log levels
//! - JSON-formatted local log files with rotation
//! - Helper macros that give chain mutations a consistent log shape
//!
//! # Example
//!
//! ```no_run
//! use dhp_vault::logging::init_logging;
//! use dhp_vault::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log a committed push
///
/// # Example
///
/// ```no_run
/// use dhp_vault::log_chain_push;
/// use dhp_vault::domain::{ChainKey, DocumentKind, PatientId, SequenceNo};
///
/// let key = ChainKey::new(PatientId::new("P1").unwrap(), DocumentKind::Dhp);
/// log_chain_push!(&key, SequenceNo::new(3), 0usize);
/// ```
#[macro_export]
macro_rules! log_chain_push {
    ($key:expr, $sequence_no:expr, $evicted:expr) => {
        tracing::info!(
            patient_id = %$key.patient_id,
            kind = %$key.kind,
            sequence_no = %$sequence_no,
            evicted = $evicted,
            "Version pushed"
        );
    };
}

/// Log a committed rollback
///
/// # Example
///
/// ```no_run
/// use dhp_vault::log_chain_rollback;
/// use dhp_vault::domain::{ChainKey, DocumentKind, PatientId, SequenceNo};
///
/// let key = ChainKey::new(PatientId::new("P1").unwrap(), DocumentKind::PlanStatus);
/// log_chain_rollback!(&key, 2usize, SequenceNo::new(5));
/// ```
#[macro_export]
macro_rules! log_chain_rollback {
    ($key:expr, $steps:expr, $head:expr) => {
        tracing::info!(
            patient_id = %$key.patient_id,
            kind = %$key.kind,
            steps = $steps,
            sequence_no = %$head,
            "Chain rolled back"
        );
    };
}

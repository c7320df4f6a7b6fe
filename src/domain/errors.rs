//! Domain error types
//!
//! This module defines the error hierarchy for the version store.
//! Backend and I/O failures are mapped into string-carrying variants so no
//! third-party error type leaks through the public API.

use thiserror::Error;

/// Main vault error type
///
/// Every fallible operation in the crate returns this type. None of these
/// errors are retried internally; retry policy belongs to the caller.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Read or rollback on a chain that has never been written
    #[error("No {kind} history found for patient '{patient_id}'")]
    PatientNotFound { patient_id: String, kind: String },

    /// The chain holds no entries
    #[error("Version chain is empty")]
    EmptyChain,

    /// Rollback requested with fewer than one step
    #[error("Rollback steps must be at least 1, got {0}")]
    InvalidSteps(usize),

    /// Rollback would discard every retained entry
    #[error("Cannot roll back {steps} step(s): only {retained} version(s) retained")]
    InsufficientHistory { steps: usize, retained: usize },

    /// Backend unreachable or transaction failure
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    /// Export destination could not be written
    #[error("Export destination '{path}' is not writable: {reason}")]
    DestinationUnwritable { path: String, reason: String },

    /// Operation attempted after the store was closed
    #[error("Store has been closed")]
    StoreClosed,

    /// Payload rejected at the boundary
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Document kind name not recognised
    #[error("Unknown document kind '{0}'. Must be one of: dhp, plan_status")]
    InvalidDocumentKind(String),

    /// Patient identifier rejected at the boundary
    #[error("Invalid patient id: {0}")]
    InvalidPatientId(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl VaultError {
    /// Whether the error comes from the caller's request rather than the environment
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            VaultError::PatientNotFound { .. }
                | VaultError::EmptyChain
                | VaultError::InvalidSteps(_)
                | VaultError::InsufficientHistory { .. }
                | VaultError::InvalidPayload(_)
                | VaultError::InvalidPatientId(_)
                | VaultError::InvalidDocumentKind(_)
        )
    }
}

impl From<std::io::Error> for VaultError {
    fn from(err: std::io::Error) -> Self {
        VaultError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(err: serde_json::Error) -> Self {
        VaultError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for VaultError {
    fn from(err: toml::de::Error) -> Self {
        VaultError::Configuration(format!("TOML parse error: {err}"))
    }
}

//! Domain models and types for the vault.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`PatientId`], [`DocumentKind`], [`SequenceNo`], [`ChainKey`])
//! - **Document payloads** ([`DocumentPayload`]), validated at the boundary
//! - **Error types** ([`VaultError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! ```rust
//! use dhp_vault::domain::{DocumentKind, DocumentPayload, PatientId};
//! use serde_json::json;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let patient_id = PatientId::new("P1")?;
//! let payload = DocumentPayload::try_from(json!({"stage": "post-op"}))?;
//!
//! // Scalars and arrays are rejected before they reach a chain
//! assert!(DocumentPayload::try_from(json!([1, 2, 3])).is_err());
//! # let _ = (patient_id, payload, DocumentKind::Dhp);
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod ids;
pub mod payload;
pub mod result;

pub use errors::VaultError;
pub use ids::{ChainKey, DocumentKind, PatientId, SequenceNo};
pub use payload::DocumentPayload;
pub use result::Result;

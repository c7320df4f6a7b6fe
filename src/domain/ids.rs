//! Domain identifier types with validation
//!
//! Newtype wrappers for the keys a version chain is addressed by.

use super::errors::VaultError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Patient identifier newtype wrapper
///
/// An opaque, stable identifier for one patient. Blank identifiers and
/// identifiers containing NUL are rejected; everything else is passed
/// through verbatim.
///
/// # Examples
///
/// ```
/// use dhp_vault::domain::ids::PatientId;
/// use std::str::FromStr;
///
/// let patient_id = PatientId::from_str("P1").unwrap();
/// assert_eq!(patient_id.as_str(), "P1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PatientId(String);

impl PatientId {
    /// Creates a new PatientId from a string
    ///
    /// # Errors
    ///
    /// Returns `VaultError::InvalidPatientId` if the id is blank or contains NUL
    pub fn new(id: impl Into<String>) -> Result<Self, VaultError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(VaultError::InvalidPatientId(
                "Patient ID cannot be empty".to_string(),
            ));
        }
        if id.contains('\0') {
            return Err(VaultError::InvalidPatientId(
                "Patient ID cannot contain NUL characters".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Returns the patient ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PatientId {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for PatientId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The document types tracked per patient
///
/// Each patient has exactly one version chain per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Digital health profile
    Dhp,
    /// Treatment plan status
    PlanStatus,
}

impl DocumentKind {
    /// All kinds, in a stable order
    pub const ALL: [DocumentKind; 2] = [DocumentKind::Dhp, DocumentKind::PlanStatus];

    /// The tag stored in the `document_kind` column
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Dhp => "dhp",
            DocumentKind::PlanStatus => "plan_status",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dhp" => Ok(DocumentKind::Dhp),
            "plan_status" | "plan-status" | "plan" => Ok(DocumentKind::PlanStatus),
            other => Err(VaultError::InvalidDocumentKind(other.to_string())),
        }
    }
}

/// Position of an entry within its chain
///
/// Strictly increasing and never reused within a chain, including across
/// evictions and rollbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SequenceNo(u64);

impl SequenceNo {
    /// Sequence number before the first push
    pub const ZERO: SequenceNo = SequenceNo(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// The sequence number that follows this one
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Converts to the signed representation stored in `BIGINT` columns
    pub fn to_db(&self) -> i64 {
        self.0 as i64
    }

    /// Converts from a `BIGINT` column value
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Serialization` for negative values
    pub fn from_db(value: i64) -> Result<Self, VaultError> {
        u64::try_from(value)
            .map(Self)
            .map_err(|_| VaultError::Serialization(format!("Negative sequence number: {value}")))
    }
}

impl fmt::Display for SequenceNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Address of one version chain: a (patient, document kind) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainKey {
    pub patient_id: PatientId,
    pub kind: DocumentKind,
}

impl ChainKey {
    pub fn new(patient_id: PatientId, kind: DocumentKind) -> Self {
        Self { patient_id, kind }
    }
}

impl fmt::Display for ChainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.patient_id, self.kind)
    }
}

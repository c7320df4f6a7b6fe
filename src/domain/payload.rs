//! Document payloads
//!
//! A payload is an opaque key/value document. The store never interprets its
//! contents; it only insists that the top level is a JSON object and that no
//! string or key contains a NUL character, which PostgreSQL `JSONB` rejects.

use super::errors::VaultError;
use super::ids::PatientId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Section of a DHP document holding the structured fields
const DHP_HARD_SECTION: &str = "hard";

/// Field inside the hard section naming the patient
const DHP_PATIENT_ALIAS: &str = "Patient Alias";

/// Structurally validated document payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct DocumentPayload(Map<String, Value>);

impl DocumentPayload {
    /// Parses a payload from JSON text
    ///
    /// # Errors
    ///
    /// Returns `VaultError::InvalidPayload` if the text is not JSON or the top
    /// level is not an object
    pub fn from_json_str(text: &str) -> Result<Self, VaultError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| VaultError::InvalidPayload(format!("Malformed JSON: {e}")))?;
        Self::try_from(value)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the payload as a JSON value
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Extracts the patient a DHP document belongs to
    ///
    /// DHP documents identify their patient through `hard["Patient Alias"]`.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::InvalidPayload` when the alias is missing or not a string
    pub fn dhp_patient_alias(&self) -> Result<PatientId, VaultError> {
        let alias = self
            .0
            .get(DHP_HARD_SECTION)
            .and_then(|hard| hard.get(DHP_PATIENT_ALIAS))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                VaultError::InvalidPayload(format!(
                    "DHP data must contain '{DHP_HARD_SECTION}.{DHP_PATIENT_ALIAS}'"
                ))
            })?;

        PatientId::new(alias)
    }
}

impl TryFrom<Value> for DocumentPayload {
    type Error = VaultError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => match find_nul(&map) {
                Some(path) => Err(VaultError::InvalidPayload(format!(
                    "NUL character (\\u0000) is not allowed in payload strings, found at '{path}'"
                ))),
                None => Ok(Self(map)),
            },
            other => Err(VaultError::InvalidPayload(format!(
                "Payload must be a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }
}

impl From<DocumentPayload> for Value {
    fn from(payload: DocumentPayload) -> Self {
        payload.into_value()
    }
}

/// Path of the first string or key holding a NUL character
fn find_nul(map: &Map<String, Value>) -> Option<String> {
    map.iter().find_map(|(key, value)| {
        if key.contains('\0') {
            return Some(key.escape_default().to_string());
        }
        find_nul_in(value).map(|rest| format!("{key}{rest}"))
    })
}

fn find_nul_in(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.contains('\0') => Some(String::new()),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, item)| find_nul_in(item).map(|rest| format!("[{i}]{rest}"))),
        Value::Object(map) => find_nul(map).map(|path| format!(".{path}")),
        _ => None,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

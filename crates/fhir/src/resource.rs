//! The [`Resource`] trait and the JSON codec every ledger value goes through.
//!
//! Contracts never touch `serde_json` directly for resource payloads: they call [`parse`] to
//! validate caller input or stored bytes and [`render`] to produce the canonical form that is
//! written to the ledger.

use crate::{FhirError, FhirResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A resource schema that can be stored by a ledger contract.
pub trait Resource: Serialize + DeserializeOwned + Clone + std::fmt::Debug {
    /// FHIR `resourceType` this schema represents (e.g. `"Patient"`).
    const RESOURCE_TYPE: &'static str;

    /// Identifier embedded in the payload, if any. Used as the ledger key when the caller does
    /// not pass one explicitly.
    fn identifier(&self) -> Option<&str>;

    /// `resourceType` as declared by the payload itself.
    fn declared_type(&self) -> Option<&str>;

    /// Patient this record belongs to, either `Patient/<id>` or a bare id.
    ///
    /// `None` for resources that are not scoped to a patient.
    fn patient_reference(&self) -> Option<&str> {
        None
    }
}

/// Decode and validate a resource from JSON bytes.
///
/// The payload must be a JSON object matching the schema exactly (unknown keys are rejected).
/// Schema mismatches report the JSON path of the failing field, e.g. `name[0].given`.
///
/// # Errors
///
/// Returns [`FhirError`] if:
/// - the bytes are not valid JSON,
/// - the JSON is not an object,
/// - any field has an unexpected type or unknown keys are present,
/// - a declared `resourceType` does not match `R::RESOURCE_TYPE`.
pub fn parse<R: Resource>(bytes: &[u8]) -> FhirResult<R> {
    let value: serde_json::Value = serde_json::from_slice(bytes).map_err(FhirError::InvalidJson)?;
    if !value.is_object() {
        return Err(FhirError::NotAnObject {
            resource_type: R::RESOURCE_TYPE,
        });
    }

    let resource: R = match serde_path_to_error::deserialize(value) {
        Ok(parsed) => parsed,
        Err(err) => {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() || path == "." {
                "<root>".to_string()
            } else {
                path
            };
            return Err(FhirError::Schema {
                resource_type: R::RESOURCE_TYPE,
                path,
                message: source.to_string(),
            });
        }
    };

    if let Some(declared) = resource.declared_type() {
        if declared != R::RESOURCE_TYPE {
            return Err(FhirError::ResourceTypeMismatch {
                expected: R::RESOURCE_TYPE,
                found: declared.to_string(),
            });
        }
    }

    Ok(resource)
}

/// Render a resource in its canonical JSON form.
pub fn render<R: Resource>(resource: &R) -> FhirResult<Vec<u8>> {
    serde_json::to_vec(resource).map_err(FhirError::Serialization)
}

/// Decode a JSON value (for example one element of an embedded collection) into a resource.
pub fn from_value<R: Resource>(value: serde_json::Value) -> FhirResult<R> {
    let bytes = serde_json::to_vec(&value).map_err(FhirError::Serialization)?;
    parse(&bytes)
}

/// Strip an optional `Patient/` prefix from a patient reference.
pub fn patient_id_from_reference(reference: &str) -> &str {
    reference.strip_prefix("Patient/").unwrap_or(reference)
}

//! Typed ledger key constructors.
//!
//! Every key a contract writes is built here, so the namespace conventions (plain identifiers
//! for resources, a fixed prefix for followed-patients sets) cannot drift between contracts
//! and cannot collide with each other.

use crate::constants::FOLLOWED_PATIENTS_PREFIX;
use crate::error::{ContractError, ContractResult};
use hlc_types::{ResourceId, TextError};

/// A key within a contract's namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerKey<'a> {
    /// A resource record, keyed by its caller-assigned identifier.
    Resource(&'a ResourceId),
    /// The followed-patients set of a practitioner.
    FollowedPatients(&'a ResourceId),
}

/// What a raw key found during a scan refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyKind {
    Resource,
    FollowedPatients,
}

impl LedgerKey<'_> {
    pub fn encode(&self) -> String {
        match self {
            LedgerKey::Resource(id) => id.as_str().to_string(),
            LedgerKey::FollowedPatients(practitioner) => {
                format!("{FOLLOWED_PATIENTS_PREFIX}{practitioner}")
            }
        }
    }

    /// Classify a raw key returned by a range scan.
    pub fn classify(raw: &str) -> KeyKind {
        if raw.starts_with(FOLLOWED_PATIENTS_PREFIX) {
            KeyKind::FollowedPatients
        } else {
            KeyKind::Resource
        }
    }
}

/// Parse an identifier that will be used as a resource key.
///
/// # Errors
///
/// - [`ContractError::MissingIdentifier`] when `raw` is empty or whitespace.
/// - [`ContractError::InvalidIdentifier`] when `raw` contains control characters or would
///   collide with the followed-patients key prefix.
pub fn resource_id(resource_type: &str, raw: &str) -> ContractResult<ResourceId> {
    let id = ResourceId::parse(raw).map_err(|err| match err {
        TextError::Empty => ContractError::MissingIdentifier(format!("{resource_type} identifier")),
        other => ContractError::InvalidIdentifier {
            id: raw.to_string(),
            reason: other.to_string(),
        },
    })?;

    if LedgerKey::classify(id.as_str()) != KeyKind::Resource {
        return Err(ContractError::InvalidIdentifier {
            id: raw.to_string(),
            reason: format!("identifiers may not start with '{FOLLOWED_PATIENTS_PREFIX}'"),
        });
    }

    Ok(id)
}

/// Parse a practitioner or patient identifier used in the followed-patients registry.
pub fn participant_id(role: &str, raw: &str) -> ContractResult<ResourceId> {
    ResourceId::parse(raw).map_err(|err| match err {
        TextError::Empty => ContractError::MissingIdentifier(format!("{role} identifier")),
        other => ContractError::InvalidIdentifier {
            id: raw.to_string(),
            reason: other.to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_resource_key_is_the_identifier() {
        let id = resource_id("Patient", "P1").expect("valid id");
        assert_eq!(LedgerKey::Resource(&id).encode(), "P1");
        assert_eq!(LedgerKey::classify("P1"), KeyKind::Resource);
    }

    #[test]
    fn test_followed_patients_key_uses_prefix() {
        let id = participant_id("practitioner", "Dr1").expect("valid id");
        let key = LedgerKey::FollowedPatients(&id).encode();
        assert_eq!(key, "followedPatients_Dr1");
        assert_eq!(LedgerKey::classify(&key), KeyKind::FollowedPatients);
    }

    #[test]
    fn test_resource_id_rejects_reserved_prefix() {
        let err = resource_id("Practitioner", "followedPatients_Dr1")
            .expect_err("prefix is reserved");
        assert_eq!(err.kind(), ErrorKind::InvalidIdentifier);
    }

    #[test]
    fn test_resource_id_rejects_empty() {
        let err = resource_id("Patient", " ").expect_err("empty id");
        assert_eq!(err.kind(), ErrorKind::MissingIdentifier);
    }
}

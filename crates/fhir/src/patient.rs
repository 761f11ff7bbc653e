//! Patient resource schema.

use crate::datatypes::{Address, ContactPoint, HumanName, Identifier, Reference};
use crate::resource::Resource;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Patient {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Identifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<Address>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub general_practitioner: Vec<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub managing_organization: Option<Reference>,
}

impl Resource for Patient {
    const RESOURCE_TYPE: &'static str = "Patient";

    fn identifier(&self) -> Option<&str> {
        self.identifier.as_ref().and_then(|i| i.value.as_deref())
    }

    fn declared_type(&self) -> Option<&str> {
        self.resource_type.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse, render, FhirError, NameUse};

    #[test]
    fn parses_minimal_patient() {
        let patient: Patient =
            parse(br#"{"identifier":{"value":"P1"}}"#).expect("should parse minimal patient");
        assert_eq!(patient.identifier(), Some("P1"));
        assert!(patient.name.is_empty());
    }

    #[test]
    fn render_of_minimal_patient_is_unchanged() {
        let input = br#"{"identifier":{"value":"P1"}}"#;
        let patient: Patient = parse(input).expect("parse");
        let output = render(&patient).expect("render");
        assert_eq!(output, input.to_vec());
    }

    #[test]
    fn round_trips_full_patient() {
        let input = br#"{
            "resourceType": "Patient",
            "identifier": {"system": "urn:nhs", "value": "9000000009"},
            "active": true,
            "name": [{"use": "official", "family": "Williams", "given": ["Sarah", "Jane"]}],
            "gender": "female",
            "birthDate": "1992-03-20",
            "generalPractitioner": [{"reference": "Practitioner/Dr1"}]
        }"#;

        let patient: Patient = parse(input).expect("parse");
        assert_eq!(patient.name[0].use_type, Some(NameUse::Official));
        let output = render(&patient).expect("render");
        let reparsed: Patient = parse(&output).expect("reparse");
        assert_eq!(patient, reparsed);
    }

    #[test]
    fn strict_validation_rejects_unknown_keys() {
        let err = parse::<Patient>(br#"{"identifier":{"value":"P1"},"unexpected_key":1}"#)
            .expect_err("should reject unknown key");
        match err {
            FhirError::Schema { message, .. } => assert!(message.contains("unexpected_key")),
            other => panic!("expected Schema error, got {other:?}"),
        }
    }

    #[test]
    fn strict_validation_reports_path_of_wrong_type() {
        let err = parse::<Patient>(br#"{"name":[{"given":"not_an_array"}]}"#)
            .expect_err("should reject wrong type");
        match err {
            FhirError::Schema { path, .. } => assert!(path.contains("given"), "path was {path}"),
            other => panic!("expected Schema error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_invalid_resource_type() {
        let err = parse::<Patient>(br#"{"resourceType":"Practitioner"}"#)
            .expect_err("should reject resourceType");
        assert!(matches!(
            err,
            FhirError::ResourceTypeMismatch { expected: "Patient", ref found } if found == "Practitioner"
        ));
    }

    #[test]
    fn rejects_non_object_payloads() {
        assert!(matches!(
            parse::<Patient>(b"[]"),
            Err(FhirError::NotAnObject { .. })
        ));
        assert!(matches!(
            parse::<Patient>(b"{not json"),
            Err(FhirError::InvalidJson(_))
        ));
    }
}

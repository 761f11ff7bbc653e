//! Practitioner and Organization resource schemas.

use crate::datatypes::{Address, CodeableConcept, ContactPoint, HumanName, Identifier, Period, Reference};
use crate::resource::Resource;
use serde::{Deserialize, Serialize};

/// A qualification held by a practitioner (licence, certificate, ...).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Qualification {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    pub code: CodeableConcept,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<Reference>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Practitioner {
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
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualification: Vec<Qualification>,
}

impl Resource for Practitioner {
    const RESOURCE_TYPE: &'static str = "Practitioner";

    fn identifier(&self) -> Option<&str> {
        self.identifier.as_ref().and_then(|i| i.value.as_deref())
    }

    fn declared_type(&self) -> Option<&str> {
        self.resource_type.as_deref()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Organization {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Identifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub kind: Vec<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alias: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPoint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_of: Option<Reference>,
}

impl Resource for Organization {
    const RESOURCE_TYPE: &'static str = "Organization";

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
    use crate::{parse, FhirError};

    #[test]
    fn qualification_requires_code() {
        let err = parse::<Practitioner>(br#"{"qualification":[{"period":{"start":"2020"}}]}"#)
            .expect_err("code is mandatory");
        match err {
            FhirError::Schema { path, message, .. } => {
                assert!(path.contains("qualification"), "path was {path}");
                assert!(message.contains("code"));
            }
            other => panic!("expected Schema error, got {other:?}"),
        }
    }

    #[test]
    fn organization_type_uses_wire_name() {
        let org: Organization =
            parse(br#"{"identifier":{"value":"O1"},"type":[{"text":"Hospital"}],"name":"St Mary"}"#)
                .expect("parse organization");
        assert_eq!(org.kind[0].text.as_deref(), Some("Hospital"));
        assert_eq!(org.identifier(), Some("O1"));
    }
}

//! Medical record folder: an aggregate of one patient's clinical items.
//!
//! The folder embeds its allergies, conditions, procedures and prescriptions by value, so the
//! whole graph is written and read as one ledger value. The folder identifier is independent of
//! the patient identifier it carries.

use crate::clinical::{AllergyIntolerance, Condition, MedicationRequest, Procedure};
use crate::datatypes::Reference;
use crate::resource::{from_value, render, Resource};
use crate::{FhirError, FhirResult};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MedicalRecordFolder {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_request: Option<Reference>,
    #[serde(default)]
    pub allergies: Vec<AllergyIntolerance>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub procedures: Vec<Procedure>,
    #[serde(default)]
    pub prescriptions: Vec<MedicationRequest>,
}

impl Resource for MedicalRecordFolder {
    const RESOURCE_TYPE: &'static str = "MedicalRecordFolder";

    fn identifier(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn declared_type(&self) -> Option<&str> {
        self.resource_type.as_deref()
    }

    fn patient_reference(&self) -> Option<&str> {
        self.patient_id.as_deref()
    }
}

/// One of the embedded collections of a [`MedicalRecordFolder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FolderSection {
    Allergies,
    Conditions,
    Procedures,
    Prescriptions,
}

impl FolderSection {
    pub const ALL: [FolderSection; 4] = [
        FolderSection::Allergies,
        FolderSection::Conditions,
        FolderSection::Procedures,
        FolderSection::Prescriptions,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FolderSection::Allergies => "allergies",
            FolderSection::Conditions => "conditions",
            FolderSection::Procedures => "procedures",
            FolderSection::Prescriptions => "prescriptions",
        }
    }
}

impl std::str::FromStr for FolderSection {
    type Err = FhirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FolderSection::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| FhirError::UnknownSection(s.to_string()))
    }
}

impl MedicalRecordFolder {
    /// Number of entries in `section`.
    pub fn section_len(&self, section: FolderSection) -> usize {
        match section {
            FolderSection::Allergies => self.allergies.len(),
            FolderSection::Conditions => self.conditions.len(),
            FolderSection::Procedures => self.procedures.len(),
            FolderSection::Prescriptions => self.prescriptions.len(),
        }
    }

    /// Decode `entry` with the schema of `section` and append it.
    pub fn push_entry(&mut self, section: FolderSection, entry: serde_json::Value) -> FhirResult<()> {
        match section {
            FolderSection::Allergies => self.allergies.push(from_value(entry)?),
            FolderSection::Conditions => self.conditions.push(from_value(entry)?),
            FolderSection::Procedures => self.procedures.push(from_value(entry)?),
            FolderSection::Prescriptions => self.prescriptions.push(from_value(entry)?),
        }
        Ok(())
    }

    /// Remove the entry at `index` from `section`, returning it rendered as JSON.
    ///
    /// Returns `None` when `index` is out of range; the folder is left untouched.
    pub fn remove_entry(&mut self, section: FolderSection, index: usize) -> FhirResult<Option<Vec<u8>>> {
        if index >= self.section_len(section) {
            return Ok(None);
        }
        let removed = match section {
            FolderSection::Allergies => render(&self.allergies.remove(index))?,
            FolderSection::Conditions => render(&self.conditions.remove(index))?,
            FolderSection::Procedures => render(&self.procedures.remove(index))?,
            FolderSection::Prescriptions => render(&self.prescriptions.remove(index))?,
        };
        Ok(Some(removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    const FOLDER: &[u8] = br#"{
        "id": "F1",
        "patientId": "Pat1",
        "serviceRequest": {"reference": "ServiceRequest/SR1"},
        "allergies": [{"identifier": {"value": "A1"}, "category": ["food"]}],
        "conditions": [],
        "procedures": [],
        "prescriptions": [{"identifier": {"value": "RX1"}, "status": "active"}]
    }"#;

    #[test]
    fn parses_embedded_graph() {
        let folder: MedicalRecordFolder = parse(FOLDER).expect("parse folder");
        assert_eq!(folder.identifier(), Some("F1"));
        assert_eq!(folder.patient_reference(), Some("Pat1"));
        assert_eq!(folder.section_len(FolderSection::Allergies), 1);
        assert_eq!(folder.section_len(FolderSection::Prescriptions), 1);
    }

    #[test]
    fn embedded_entries_are_validated() {
        let err = parse::<MedicalRecordFolder>(br#"{"id":"F1","conditions":[{"bogus":true}]}"#)
            .expect_err("embedded entries use strict schemas");
        match err {
            FhirError::Schema { path, .. } => assert!(path.starts_with("conditions"), "path was {path}"),
            other => panic!("expected Schema error, got {other:?}"),
        }
    }

    #[test]
    fn push_and_remove_entries() {
        let mut folder: MedicalRecordFolder = parse(FOLDER).expect("parse folder");
        folder
            .push_entry(
                FolderSection::Conditions,
                serde_json::json!({"identifier": {"value": "C1"}, "code": {"text": "Asthma"}}),
            )
            .expect("push condition");
        assert_eq!(folder.section_len(FolderSection::Conditions), 1);

        let removed = folder
            .remove_entry(FolderSection::Allergies, 0)
            .expect("render removed")
            .expect("index 0 exists");
        assert!(String::from_utf8_lossy(&removed).contains("A1"));
        assert_eq!(folder.section_len(FolderSection::Allergies), 0);

        assert!(folder
            .remove_entry(FolderSection::Allergies, 0)
            .expect("no render error")
            .is_none());
    }

    #[test]
    fn push_rejects_wrong_schema() {
        let mut folder = MedicalRecordFolder::default();
        let err = folder
            .push_entry(FolderSection::Procedures, serde_json::json!(["not", "an", "object"]))
            .expect_err("arrays are not procedures");
        assert!(matches!(err, FhirError::NotAnObject { resource_type: "Procedure" }));
    }

    #[test]
    fn sections_parse_from_wire_names() {
        assert_eq!("procedures".parse::<FolderSection>().ok(), Some(FolderSection::Procedures));
        assert!(matches!(
            "labs".parse::<FolderSection>(),
            Err(FhirError::UnknownSection(_))
        ));
    }
}

//! FHIR-aligned resource schemas for the ledger contracts.
//!
//! This crate provides **wire models** and the JSON codec for every resource a contract stores:
//! - patients, practitioners and organizations,
//! - patient-scoped clinical items (encounters, conditions, procedures, allergies, lab results,
//!   prescriptions),
//! - the medical record folder aggregate.
//!
//! The schemas are plain data: no storage or access-control behaviour lives here. Contracts use
//! [`parse`] to validate input and [`render`] to produce the canonical bytes they write.

pub mod clinical;
pub mod datatypes;
pub mod folder;
pub mod patient;
pub mod practitioner;
pub mod resource;

pub use clinical::{
    AllergyIntolerance, AllergyReaction, Condition, Dosage, Encounter, MedicationRequest,
    Observation, Procedure,
};
pub use datatypes::{
    Address, Annotation, CodeableConcept, Coding, ContactPoint, HumanName, Identifier, NameUse,
    Period, Quantity, Reference,
};
pub use folder::{FolderSection, MedicalRecordFolder};
pub use patient::Patient;
pub use practitioner::{Organization, Practitioner, Qualification};
pub use resource::{from_value, parse, patient_id_from_reference, render, Resource};

/// Errors returned by the `fhir` crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("{resource_type} payload must be a JSON object")]
    NotAnObject { resource_type: &'static str },

    #[error("{resource_type} schema mismatch at {path}: {message}")]
    Schema {
        resource_type: &'static str,
        path: String,
        message: String,
    },

    #[error("expected resourceType '{expected}', got '{found}'")]
    ResourceTypeMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("unknown folder section '{0}'")]
    UnknownSection(String),

    #[error("failed to serialize resource: {0}")]
    Serialization(serde_json::Error),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;

//! The contracts installed on a standard host.

pub mod folder;
pub mod patient;
pub mod practitioner;
pub mod standard;

pub use folder::FolderContract;
pub use patient::PatientContract;
pub use practitioner::PractitionerContract;
pub use standard::StandardContract;

//! Constants used throughout the HLC core crate.
//!
//! Contract names double as ledger namespaces: each contract's keys live under its own name.

/// Channel served by a host when none is configured.
pub const DEFAULT_CHANNEL_ID: &str = "healthchannel";

pub const PATIENT_CONTRACT: &str = "patient";
pub const PRACTITIONER_CONTRACT: &str = "practitioner";
pub const ORGANIZATION_CONTRACT: &str = "organization";
pub const ENCOUNTER_CONTRACT: &str = "encounter";
pub const PRESCRIPTION_CONTRACT: &str = "prescription";
pub const LAB_RESULT_CONTRACT: &str = "labresult";
pub const CONDITION_CONTRACT: &str = "condition";
pub const PROCEDURE_CONTRACT: &str = "procedure";
pub const ALLERGY_CONTRACT: &str = "allergy";
pub const FOLDER_CONTRACT: &str = "folder";

/// Identity attribute carrying the caller's user identifier.
pub const USER_ID_ATTRIBUTE: &str = "userId";

/// Patient contract function used by the authorization delegate.
pub const CHECK_ACCESS_FUNCTION: &str = "CheckAccess";

/// Practitioner contract function listing a practitioner's followed patients.
pub const READ_FOLLOWED_PATIENTS_FUNCTION: &str = "ReadFollowedPatients";

/// Prefix of followed-patients registry keys in the practitioner namespace.
pub const FOLLOWED_PATIENTS_PREFIX: &str = "followedPatients_";

/// Response status for a successful invocation.
pub const STATUS_OK: i32 = 200;

/// Response status for a failed invocation.
pub const STATUS_ERROR: i32 = 500;

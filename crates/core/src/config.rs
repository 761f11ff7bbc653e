//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into the contract host. Core code never reads process-wide environment variables
//! during request handling; binaries parse them with the helpers below and build a
//! [`CoreConfig`].

use crate::constants::{DEFAULT_CHANNEL_ID, PATIENT_CONTRACT, PRACTITIONER_CONTRACT};
use crate::error::{ContractError, ContractResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    channel_id: String,
    patient_contract: String,
    practitioner_contract: String,
    seed_file: Option<PathBuf>,
}

impl CoreConfig {
    /// Create a new `CoreConfig` using the standard contract names.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::Config`] if `channel_id` is empty.
    pub fn new(channel_id: impl Into<String>, seed_file: Option<PathBuf>) -> ContractResult<Self> {
        let channel_id = channel_id.into();
        if channel_id.trim().is_empty() {
            return Err(ContractError::Config("channel_id cannot be empty".into()));
        }

        Ok(Self {
            channel_id,
            patient_contract: PATIENT_CONTRACT.to_string(),
            practitioner_contract: PRACTITIONER_CONTRACT.to_string(),
            seed_file,
        })
    }

    /// Override the contract names used by the authorization delegate.
    pub fn with_contract_names(
        mut self,
        patient_contract: impl Into<String>,
        practitioner_contract: impl Into<String>,
    ) -> ContractResult<Self> {
        let patient_contract = patient_contract.into();
        let practitioner_contract = practitioner_contract.into();
        if patient_contract.trim().is_empty() || practitioner_contract.trim().is_empty() {
            return Err(ContractError::Config("contract names cannot be empty".into()));
        }
        self.patient_contract = patient_contract;
        self.practitioner_contract = practitioner_contract;
        Ok(self)
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    pub fn patient_contract(&self) -> &str {
        &self.patient_contract
    }

    pub fn practitioner_contract(&self) -> &str {
        &self.practitioner_contract
    }

    pub fn seed_file(&self) -> Option<&Path> {
        self.seed_file.as_deref()
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            channel_id: DEFAULT_CHANNEL_ID.to_string(),
            patient_contract: PATIENT_CONTRACT.to_string(),
            practitioner_contract: PRACTITIONER_CONTRACT.to_string(),
            seed_file: None,
        }
    }
}

/// Parse the channel id from an optional environment value.
///
/// If `value` is `None` or empty/whitespace, returns the default channel.
pub fn channel_id_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_CHANNEL_ID.to_string())
}

/// Parse the seed file path from an optional environment value.
pub fn seed_file_from_env_value(value: Option<String>) -> Option<PathBuf> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty_channel() {
        let err = CoreConfig::new("  ", None).expect_err("empty channel should be rejected");
        assert!(matches!(err, ContractError::Config(_)));
    }

    #[test]
    fn test_default_uses_standard_names() {
        let cfg = CoreConfig::default();
        assert_eq!(cfg.channel_id(), DEFAULT_CHANNEL_ID);
        assert_eq!(cfg.patient_contract(), PATIENT_CONTRACT);
        assert_eq!(cfg.practitioner_contract(), PRACTITIONER_CONTRACT);
        assert!(cfg.seed_file().is_none());
    }

    #[test]
    fn test_with_contract_names_overrides() {
        let cfg = CoreConfig::new("c1", None)
            .expect("valid config")
            .with_contract_names("people", "clinicians")
            .expect("valid names");
        assert_eq!(cfg.patient_contract(), "people");
        assert_eq!(cfg.practitioner_contract(), "clinicians");
        assert!(CoreConfig::default().with_contract_names("", "x").is_err());
    }

    #[test]
    fn test_env_value_parsing() {
        assert_eq!(channel_id_from_env_value(None), DEFAULT_CHANNEL_ID);
        assert_eq!(channel_id_from_env_value(Some("  ".into())), DEFAULT_CHANNEL_ID);
        assert_eq!(channel_id_from_env_value(Some(" c2 ".into())), "c2");
        assert_eq!(seed_file_from_env_value(Some(String::new())), None);
        assert_eq!(
            seed_file_from_env_value(Some("seed.json".into())),
            Some(PathBuf::from("seed.json"))
        );
    }
}

//! Error types for the ledger host and the contracts running on it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Failures raised by the in-memory ledger (the store adapter's backing implementation).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("MVCC read conflict on {namespace}/{key}: value changed since it was read")]
    ReadConflict { namespace: String, key: String },
    #[error("invalid rich query: {0}")]
    InvalidQuery(String),
    #[error("unknown channel '{0}'")]
    UnknownChannel(String),
    #[error("ledger state lock poisoned")]
    Poisoned,
    #[error("failed to read seed file {path}: {source}", path = path.display())]
    SeedRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed seed file: {0}")]
    SeedFormat(serde_json::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Programmatic classification of a [`ContractError`].
///
/// This is what crosses the wire in failure payloads, so clients can branch on the failure
/// without parsing messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidPayload,
    MissingIdentifier,
    InvalidIdentifier,
    InvalidArguments,
    UnknownFunction,
    UnknownContract,
    AlreadyExists,
    NotFound,
    AuthorizationDenied,
    IdentityAttributeMissing,
    StoreError,
    DecodeError,
    InvalidIndex,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidPayload => "InvalidPayload",
            ErrorKind::MissingIdentifier => "MissingIdentifier",
            ErrorKind::InvalidIdentifier => "InvalidIdentifier",
            ErrorKind::InvalidArguments => "InvalidArguments",
            ErrorKind::UnknownFunction => "UnknownFunction",
            ErrorKind::UnknownContract => "UnknownContract",
            ErrorKind::AlreadyExists => "AlreadyExists",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::AuthorizationDenied => "AuthorizationDenied",
            ErrorKind::IdentityAttributeMissing => "IdentityAttributeMissing",
            ErrorKind::StoreError => "StoreError",
            ErrorKind::DecodeError => "DecodeError",
            ErrorKind::InvalidIndex => "InvalidIndex",
            ErrorKind::Internal => "Internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("missing identifier: {0}")]
    MissingIdentifier(String),
    #[error("invalid identifier '{id}': {reason}")]
    InvalidIdentifier { id: String, reason: String },
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("contract '{contract}' has no function '{function}'")]
    UnknownFunction { contract: String, function: String },
    #[error("no contract named '{0}' is installed")]
    UnknownContract(String),
    #[error("{resource_type} {id} already exists")]
    AlreadyExists {
        resource_type: &'static str,
        id: String,
    },
    #[error("{resource_type} {id} does not exist")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },
    #[error("caller {caller} is not authorized to access {patient}")]
    AuthorizationDenied { patient: String, caller: String },
    #[error("caller identity has no '{0}' attribute")]
    IdentityAttributeMissing(String),
    #[error("ledger error: {0}")]
    Store(#[from] StoreError),
    #[error("failed to decode record {key}: {message}")]
    DecodeError { key: String, message: String },
    #[error("index {index} is out of range for {len} entries")]
    InvalidIndex { index: String, len: usize },
    #[error("failed to serialize response: {0}")]
    Serialization(serde_json::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ContractError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ContractError::InvalidPayload(_) => ErrorKind::InvalidPayload,
            ContractError::MissingIdentifier(_) => ErrorKind::MissingIdentifier,
            ContractError::InvalidIdentifier { .. } => ErrorKind::InvalidIdentifier,
            ContractError::InvalidArguments(_) => ErrorKind::InvalidArguments,
            ContractError::UnknownFunction { .. } => ErrorKind::UnknownFunction,
            ContractError::UnknownContract(_) => ErrorKind::UnknownContract,
            ContractError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            ContractError::NotFound { .. } => ErrorKind::NotFound,
            ContractError::AuthorizationDenied { .. } => ErrorKind::AuthorizationDenied,
            ContractError::IdentityAttributeMissing(_) => ErrorKind::IdentityAttributeMissing,
            ContractError::Store(_) => ErrorKind::StoreError,
            ContractError::DecodeError { .. } => ErrorKind::DecodeError,
            ContractError::InvalidIndex { .. } => ErrorKind::InvalidIndex,
            ContractError::Serialization(_) | ContractError::Config(_) => ErrorKind::Internal,
        }
    }
}

impl From<fhir::FhirError> for ContractError {
    fn from(err: fhir::FhirError) -> Self {
        match err {
            fhir::FhirError::Serialization(e) => ContractError::Serialization(e),
            other => ContractError::InvalidPayload(other.to_string()),
        }
    }
}

pub type ContractResult<T> = std::result::Result<T, ContractError>;

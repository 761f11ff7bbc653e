//! # HLC Core
//!
//! Ledger-backed clinical record contracts and the host they run on.
//!
//! - [`ledger`]: in-memory ledger with MVCC validation, range scans and rich queries
//! - [`host`]: contract registry, transaction lifecycle and the per-invocation stub
//! - [`store`]: the store adapter traits contracts are written against
//! - [`resource`]: generic create/read/update/delete/search for one resource type
//! - [`auth`]: the cross-contract authorization delegate
//! - [`registry`]: the followed-patients registry
//! - [`contracts`]: the patient, practitioner, folder and standard contracts
//! - [`network`]: assembly of a host with every contract installed
//!
//! **No API concerns**: gRPC and REST servers live in `api-grpc` and `api-rest`.

pub mod args;
pub mod auth;
pub mod config;
pub mod constants;
pub mod contracts;
pub mod error;
pub mod host;
pub mod keys;
pub mod ledger;
pub mod network;
pub mod registry;
pub mod resource;
pub mod search;
pub mod seed;
pub mod store;

pub use auth::{AuthorizationChecker, PatientContractAuthorizer};
pub use config::CoreConfig;
pub use error::{ContractError, ContractResult, ErrorKind, StoreError, StoreResult};
pub use host::{ack, Contract, ContractHost, ContractStub, FailurePayload, Proposal, Response};
pub use ledger::{Identity, MemoryLedger, QueryCursor, QueryMetadata, QueryRecord};
pub use network::default_host;
pub use store::{ContractContext, StateStore};

//! # API Shared
//!
//! Shared utilities and definitions for the HLC gateways.
//!
//! Contains:
//! - Protobuf-generated types (`pb` module)
//! - Shared services like `HealthService`
//! - Authentication utilities (usable by both gRPC and REST)
//! - Conversions between wire messages and `hlc-core` proposals and responses
//!
//! Used by `api-grpc` and `api-rest` for common functionality.

// Re-export the generated protobuf module. The generated code will be placed
// into OUT_DIR at build time by the build script.
pub mod pb {
    tonic::include_proto!("hlc.v1");
}

pub mod auth;
pub mod convert;
pub mod health;

pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("proto_descriptor");

pub use convert::list_contracts;
pub use health::HealthService;
pub use pb::*;

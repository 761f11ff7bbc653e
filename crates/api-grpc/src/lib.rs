//! # API gRPC
//!
//! gRPC gateway for the HLC contract host.
//!
//! Handles:
//! - gRPC service setup and authentication
//! - `Submit`/`Evaluate` forwarding to a shared `hlc-core` host
//! - gRPC-specific concerns (interceptors, tonic integration)
//!
//! Uses `api-shared` for common types and utilities.

#![warn(rust_2018_idioms)]

pub use service::{auth_interceptor, pb, GatewayService};

pub mod service;

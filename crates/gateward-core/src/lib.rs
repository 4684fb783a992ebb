//! Core infrastructure for the Gateward gateway.
//!
//! This crate contains the two coordinating components of the gateway, the
//! admission controller and the token lifecycle manager, together with the
//! axum extractors and middleware that expose them to routes. Both components
//! talk to their stores exclusively through the adapter traits in
//! `gateward-types`, so they carry no state of their own beyond
//! configuration.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod admission;
pub mod extract;
pub mod prelude;
pub mod settings;
pub mod tokens;

// Re-export commonly used types
pub use admission::{AdmissionController, AdmissionLayer, AdmitDecision};
pub use extract::{Auth, OptionalAuth, OptionalRequestId, RequestId};
pub use settings::{DownstreamTarget, GatewaySettings, ServerMode};
pub use tokens::{TokenManager, TokenPair};

// vim: ts=4

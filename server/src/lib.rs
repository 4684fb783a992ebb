//! Gateward is a self-contained edge gateway for small service fleets.
//!
//! # Features
//!
//! - Admission control
//!		- windowed per-client quotas, global plus per-route-class tiers
//!		- counters live in a shared store, replicas share windows
//!		- per-tier fail-open or fail-closed when the store is down
//!	- Token lifecycle
//!		- short-lived signed access tokens, validated statelessly
//!		- opaque refresh tokens with single-use rotation and revocation
//!		- multi-device sessions per subject
//!	- Dispatch
//!		- path-prefix routing to named downstream services
//!		- identity headers injected after validation
//!		- bounded connect and read timeouts

#![forbid(unsafe_code)]

pub mod app;
pub mod auth;
pub mod dispatch;
pub mod middleware;
pub mod prelude;
pub mod routes;
pub mod types;

pub use crate::app::{run, App, AppBuilder, AppState};
pub use gateward_core::{DownstreamTarget, GatewaySettings, ServerMode};
pub use gateward_types::{counter_adapter, identity_adapter, token_adapter};

// vim: ts=4

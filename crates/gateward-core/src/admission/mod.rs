//! Request admission
//!
//! Windowed quota admission against a shared counter store. Every request is
//! charged against the global tier and its route tier before it reaches a
//! handler.

mod config;
mod controller;
mod extractors;
mod middleware;

pub use config::{AdmissionConfig, FailPolicy, TierConfig};
pub use controller::{AdmissionController, AdmitDecision};
pub use extractors::extract_client_key;
pub use middleware::{AdmissionLayer, AdmissionService};

// vim: ts=4

//! Shared types, adapter traits, and the canonical error type for Gateward.
//!
//! This crate contains the foundational types that are shared between the
//! server crate and all adapter implementations. Extracting these into a
//! separate crate allows adapter crates to compile in parallel with the
//! server's feature modules.

pub mod counter_adapter;
pub mod error;
pub mod identity_adapter;
pub mod prelude;
pub mod token_adapter;
pub mod types;

// vim: ts=4

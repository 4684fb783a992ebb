//! Auth endpoints
//!
//! Login, refresh rotation, logout and session listing. Credential checking
//! is delegated to the identity adapter; token state lives behind the token
//! manager.

pub mod handler;

// vim: ts=4

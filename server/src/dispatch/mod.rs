//! Request dispatch to downstream services

pub mod handler;

// vim: ts=4

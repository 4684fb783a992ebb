//! Collaborator interface for credential verification.
//!
//! Gateward does not persist users. The login endpoint delegates credential
//! checking to whatever identity service the deployment wires in behind this
//! trait.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::prelude::*;

/// A verified principal returned by the identity collaborator.
#[derive(Clone, Debug)]
pub struct Subject {
	pub subject_id: SubjectId,
	pub handle: Box<str>,
}

#[async_trait]
pub trait IdentityAdapter: Debug + Send + Sync {
	/// Checks a handle/password pair, returning the subject on success and
	/// [`Error::InvalidCredential`] otherwise.
	async fn verify_credentials(&self, handle: &str, password: &str) -> GwResult<Subject>;
}

// vim: ts=4

//! Adapter contract for the persistent refresh-token store.
//!
//! Refresh tokens are opaque values whose only meaning is the record stored
//! behind them. The token lifecycle manager is the sole writer; adapters
//! provide the atomic primitives it builds rotation on.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::prelude::*;

/// One persisted refresh-token record. The token value itself is the key.
#[derive(Clone, Debug)]
pub struct RefreshTokenRecord {
	pub token: Box<str>,
	pub subject_id: SubjectId,
	pub handle: Box<str>,
	pub expires_at: Timestamp,
	pub revoked: bool,
}

/// Context struct for an authenticated subject, attached to requests after
/// access-token validation.
#[derive(Clone, Debug)]
pub struct AuthCtx {
	pub subject_id: SubjectId,
	pub handle: Box<str>,
}

/// Outcome of the check-and-set consume on a refresh value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsumeOutcome {
	/// The record was live and this call marked it revoked
	Consumed,
	/// The revoked flag was already set, a concurrent rotation won
	AlreadyUsed,
	/// No live record exists for this value
	Missing,
}

/// A Gateward token adapter.
///
/// Implementations serialize `consume_refresh_token` per token value so that
/// at most one concurrent caller observes [`ConsumeOutcome::Consumed`].
#[async_trait]
pub trait TokenAdapter: Debug + Send + Sync {
	/// Persists a freshly issued refresh-token record
	async fn create_refresh_token(&self, record: &RefreshTokenRecord) -> GwResult<()>;

	/// Reads a record by token value, [`Error::NotFound`] if absent
	async fn read_refresh_token(&self, token: &str) -> GwResult<RefreshTokenRecord>;

	/// Check-and-set on the revoked flag of a live, unexpired record
	async fn consume_refresh_token(&self, token: &str, now: Timestamp)
		-> GwResult<ConsumeOutcome>;

	/// Marks a record revoked. Idempotent: missing or already-revoked is Ok
	async fn revoke_refresh_token(&self, token: &str) -> GwResult<()>;

	/// Lists all records for one subject (multi-device sessions)
	async fn list_subject_tokens(&self, subject_id: SubjectId)
		-> GwResult<Vec<RefreshTokenRecord>>;

	/// Deletes records whose expiry is at or before `now`, returning the count
	async fn purge_expired(&self, now: Timestamp) -> GwResult<u32>;
}

// vim: ts=4

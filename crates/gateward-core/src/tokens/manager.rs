//! Token lifecycle manager
//!
//! Issues paired access and refresh tokens, validates access tokens
//! statelessly and rotates or revokes refresh tokens through the token
//! adapter. Refresh state lives entirely in the store; this type holds only
//! the signing keys and TTLs, so any replica can serve any token.

use std::fmt::Write as _;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;

use gateward_types::token_adapter::{AuthCtx, ConsumeOutcome, RefreshTokenRecord, TokenAdapter};

use super::claims::AccessClaims;
use crate::prelude::*;
use crate::settings::GatewaySettings;

const REFRESH_TOKEN_BYTES: usize = 40;

/// One freshly issued access/refresh pair
#[derive(Clone, Debug)]
pub struct TokenPair {
	pub access_token: Box<str>,
	pub refresh_token: Box<str>,
	/// Access token lifetime in seconds
	pub expires_in: i64,
}

pub struct TokenManager {
	store: Arc<dyn TokenAdapter>,
	encoding_key: EncodingKey,
	decoding_key: DecodingKey,
	access_ttl_secs: i64,
	refresh_ttl_secs: i64,
	store_timeout: Duration,
}

impl TokenManager {
	pub fn new(store: Arc<dyn TokenAdapter>, settings: &GatewaySettings) -> GwResult<Self> {
		if settings.signing_secret.is_empty() {
			return Err(Error::ConfigError("signing secret must not be empty".into()));
		}
		let secret = settings.signing_secret.as_bytes();
		Ok(Self {
			store,
			encoding_key: EncodingKey::from_secret(secret),
			decoding_key: DecodingKey::from_secret(secret),
			access_ttl_secs: settings.access_ttl_secs,
			refresh_ttl_secs: settings.refresh_ttl_secs,
			store_timeout: settings.store_timeout,
		})
	}

	/// Signs a new access token and persists a new refresh record
	pub async fn issue(&self, subject_id: SubjectId, handle: &str) -> GwResult<TokenPair> {
		let access_token = self.sign_access(subject_id, handle)?;
		let refresh_token = generate_refresh_token();
		let record = RefreshTokenRecord {
			token: refresh_token.clone(),
			subject_id,
			handle: handle.into(),
			expires_at: Timestamp::from_now(self.refresh_ttl_secs),
			revoked: false,
		};
		self.bounded(self.store.create_refresh_token(&record)).await?;
		info!("issued token pair for subject {}", subject_id);
		Ok(TokenPair { access_token, refresh_token, expires_in: self.access_ttl_secs })
	}

	/// Verifies signature and expiry without touching the store
	pub fn validate_access(&self, token: &str) -> GwResult<AuthCtx> {
		let mut validation = Validation::new(Algorithm::HS256);
		validation.leeway = 0;
		let data = decode::<AccessClaims>(token, &self.decoding_key, &validation)
			.map_err(|err| {
				debug!("access token rejected: {}", err);
				Error::InvalidCredential
			})?;
		Ok(AuthCtx {
			subject_id: SubjectId(data.claims.sub),
			handle: data.claims.handle,
		})
	}

	/// Consumes the old refresh value and issues a fresh pair. At most one of
	/// any number of concurrent callers with the same value wins; the rest
	/// get [`Error::RotationConflict`].
	pub async fn rotate(&self, refresh_token: &str) -> GwResult<TokenPair> {
		let now = Timestamp::now();
		match self.bounded(self.store.consume_refresh_token(refresh_token, now)).await? {
			ConsumeOutcome::Consumed => {}
			ConsumeOutcome::AlreadyUsed => {
				warn!("refresh token reused after rotation or revocation");
				return Err(Error::RotationConflict);
			}
			ConsumeOutcome::Missing => return Err(Error::InvalidCredential),
		}

		// The new record is created only after the old one is consumed
		let record = self.bounded(self.store.read_refresh_token(refresh_token)).await?;
		self.issue(record.subject_id, &record.handle).await
	}

	/// Marks the refresh record revoked. Unknown or already-revoked values
	/// succeed, so logout never fails for a stale client.
	pub async fn revoke(&self, refresh_token: &str) -> GwResult<()> {
		self.bounded(self.store.revoke_refresh_token(refresh_token)).await
	}

	/// Lists live refresh records for one subject (multi-device sessions)
	pub async fn sessions(&self, subject_id: SubjectId) -> GwResult<Vec<RefreshTokenRecord>> {
		let records = self.bounded(self.store.list_subject_tokens(subject_id)).await?;
		let now = Timestamp::now();
		Ok(records
			.into_iter()
			.filter(|record| !record.revoked && record.expires_at > now)
			.collect())
	}

	/// Deletes expired refresh records, returning the count
	pub async fn purge_expired(&self) -> GwResult<u32> {
		self.bounded(self.store.purge_expired(Timestamp::now())).await
	}

	fn sign_access(&self, subject_id: SubjectId, handle: &str) -> GwResult<Box<str>> {
		let iat = Timestamp::now();
		let claims = AccessClaims {
			sub: subject_id.0,
			handle: handle.into(),
			iat: iat.0,
			exp: iat.0 + self.access_ttl_secs,
		};
		encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
			.map(String::into_boxed_str)
			.map_err(|err| {
				error!("access token signing failed: {}", err);
				Error::Internal("token signing failed".into())
			})
	}

	async fn bounded<T>(&self, call: impl Future<Output = GwResult<T>>) -> GwResult<T> {
		match tokio::time::timeout(self.store_timeout, call).await {
			Ok(res) => res,
			Err(_) => {
				warn!("token store timed out after {:?}", self.store_timeout);
				Err(Error::StoreUnavailable)
			}
		}
	}
}

impl std::fmt::Debug for TokenManager {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TokenManager")
			.field("access_ttl_secs", &self.access_ttl_secs)
			.field("refresh_ttl_secs", &self.refresh_ttl_secs)
			.finish_non_exhaustive()
	}
}

fn generate_refresh_token() -> Box<str> {
	let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
	rand::rng().fill_bytes(&mut bytes);
	let mut out = String::with_capacity(REFRESH_TOKEN_BYTES * 2);
	for byte in bytes {
		let _ = write!(out, "{:02x}", byte);
	}
	out.into_boxed_str()
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use std::collections::HashMap;
	use std::sync::Mutex;

	#[derive(Debug, Default)]
	struct MockTokenStore {
		records: Mutex<HashMap<String, RefreshTokenRecord>>,
	}

	#[async_trait]
	impl TokenAdapter for MockTokenStore {
		async fn create_refresh_token(&self, record: &RefreshTokenRecord) -> GwResult<()> {
			self.records
				.lock()
				.unwrap()
				.insert(record.token.to_string(), record.clone());
			Ok(())
		}

		async fn read_refresh_token(&self, token: &str) -> GwResult<RefreshTokenRecord> {
			self.records.lock().unwrap().get(token).cloned().ok_or(Error::NotFound)
		}

		async fn consume_refresh_token(
			&self,
			token: &str,
			now: Timestamp,
		) -> GwResult<ConsumeOutcome> {
			let mut records = self.records.lock().unwrap();
			match records.get_mut(token) {
				Some(record) if record.revoked => Ok(ConsumeOutcome::AlreadyUsed),
				Some(record) if record.expires_at <= now => Ok(ConsumeOutcome::Missing),
				Some(record) => {
					record.revoked = true;
					Ok(ConsumeOutcome::Consumed)
				}
				None => Ok(ConsumeOutcome::Missing),
			}
		}

		async fn revoke_refresh_token(&self, token: &str) -> GwResult<()> {
			if let Some(record) = self.records.lock().unwrap().get_mut(token) {
				record.revoked = true;
			}
			Ok(())
		}

		async fn list_subject_tokens(
			&self,
			subject_id: SubjectId,
		) -> GwResult<Vec<RefreshTokenRecord>> {
			Ok(self
				.records
				.lock()
				.unwrap()
				.values()
				.filter(|record| record.subject_id == subject_id)
				.cloned()
				.collect())
		}

		async fn purge_expired(&self, now: Timestamp) -> GwResult<u32> {
			let mut records = self.records.lock().unwrap();
			let before = records.len();
			records.retain(|_, record| record.expires_at > now);
			Ok((before - records.len()) as u32)
		}
	}

	fn settings(secret: &str) -> GatewaySettings {
		GatewaySettings { signing_secret: secret.into(), ..GatewaySettings::default() }
	}

	fn manager(secret: &str) -> TokenManager {
		TokenManager::new(Arc::new(MockTokenStore::default()), &settings(secret)).unwrap()
	}

	#[test]
	fn test_empty_secret_rejected() {
		let result = TokenManager::new(Arc::new(MockTokenStore::default()), &settings(""));
		assert!(matches!(result, Err(Error::ConfigError(_))));
	}

	#[tokio::test]
	async fn test_issue_and_validate() {
		let manager = manager("test-secret");
		let pair = manager.issue(SubjectId(7), "alice").await.unwrap();

		assert_eq!(pair.refresh_token.len(), REFRESH_TOKEN_BYTES * 2);
		assert_eq!(pair.expires_in, 900);

		let ctx = manager.validate_access(&pair.access_token).unwrap();
		assert_eq!(ctx.subject_id, SubjectId(7));
		assert_eq!(&*ctx.handle, "alice");
	}

	#[tokio::test]
	async fn test_validate_rejects_garbage() {
		let manager = manager("test-secret");
		assert!(matches!(
			manager.validate_access("not-a-jwt"),
			Err(Error::InvalidCredential)
		));
	}

	#[tokio::test]
	async fn test_validate_rejects_foreign_signature() {
		let ours = manager("test-secret");
		let theirs = manager("other-secret");
		let pair = theirs.issue(SubjectId(7), "alice").await.unwrap();
		assert!(matches!(
			ours.validate_access(&pair.access_token),
			Err(Error::InvalidCredential)
		));
	}

	#[tokio::test]
	async fn test_validate_rejects_expired() {
		let settings = GatewaySettings {
			signing_secret: "test-secret".into(),
			access_ttl_secs: -60,
			..GatewaySettings::default()
		};
		let manager = TokenManager::new(Arc::new(MockTokenStore::default()), &settings).unwrap();
		let pair = manager.issue(SubjectId(7), "alice").await.unwrap();
		assert!(matches!(
			manager.validate_access(&pair.access_token),
			Err(Error::InvalidCredential)
		));
	}

	#[tokio::test]
	async fn test_rotate_issues_new_pair() {
		let manager = manager("test-secret");
		let pair = manager.issue(SubjectId(7), "alice").await.unwrap();

		let rotated = manager.rotate(&pair.refresh_token).await.unwrap();
		assert_ne!(rotated.refresh_token, pair.refresh_token);

		let ctx = manager.validate_access(&rotated.access_token).unwrap();
		assert_eq!(ctx.subject_id, SubjectId(7));
	}

	#[tokio::test]
	async fn test_rotate_consumes_old_value() {
		let manager = manager("test-secret");
		let pair = manager.issue(SubjectId(7), "alice").await.unwrap();

		manager.rotate(&pair.refresh_token).await.unwrap();
		assert!(matches!(
			manager.rotate(&pair.refresh_token).await,
			Err(Error::RotationConflict)
		));
	}

	#[tokio::test]
	async fn test_rotate_unknown_value() {
		let manager = manager("test-secret");
		assert!(matches!(
			manager.rotate("0000000000000000").await,
			Err(Error::InvalidCredential)
		));
	}

	#[tokio::test]
	async fn test_revoke_is_idempotent() {
		let manager = manager("test-secret");
		let pair = manager.issue(SubjectId(7), "alice").await.unwrap();

		manager.revoke(&pair.refresh_token).await.unwrap();
		manager.revoke(&pair.refresh_token).await.unwrap();
		manager.revoke("unknown-value").await.unwrap();

		assert!(matches!(
			manager.rotate(&pair.refresh_token).await,
			Err(Error::RotationConflict)
		));
	}

	#[tokio::test]
	async fn test_revoke_leaves_other_sessions_live() {
		let manager = manager("test-secret");
		let phone = manager.issue(SubjectId(7), "alice").await.unwrap();
		let laptop = manager.issue(SubjectId(7), "alice").await.unwrap();

		manager.revoke(&phone.refresh_token).await.unwrap();

		let sessions = manager.sessions(SubjectId(7)).await.unwrap();
		assert_eq!(sessions.len(), 1);
		assert_eq!(sessions[0].token, laptop.refresh_token);
		assert!(manager.rotate(&laptop.refresh_token).await.is_ok());
	}

	#[tokio::test]
	async fn test_refresh_tokens_are_unique() {
		let manager = manager("test-secret");
		let a = manager.issue(SubjectId(7), "alice").await.unwrap();
		let b = manager.issue(SubjectId(7), "alice").await.unwrap();
		assert_ne!(a.refresh_token, b.refresh_token);
	}
}

// vim: ts=4

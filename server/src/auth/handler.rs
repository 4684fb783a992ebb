use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::prelude::*;
use crate::types::ApiResponse;
use gateward_core::{Auth, OptionalRequestId, TokenPair};

/// # Login
#[derive(Serialize)]
pub struct Login {
	#[serde(rename = "subjectId")]
	subject_id: SubjectId,
	handle: String,
	#[serde(rename = "accessToken")]
	access_token: String,
	#[serde(rename = "refreshToken")]
	refresh_token: String,
	#[serde(rename = "expiresIn")]
	expires_in: i64,
}

impl Login {
	fn new(subject_id: SubjectId, handle: &str, pair: TokenPair) -> Self {
		Login {
			subject_id,
			handle: handle.to_string(),
			access_token: pair.access_token.to_string(),
			refresh_token: pair.refresh_token.to_string(),
			expires_in: pair.expires_in,
		}
	}
}

/// # POST /api/auth/login
#[derive(Deserialize)]
pub struct LoginReq {
	handle: String,
	password: String,
}

pub async fn post_login(
	State(app): State<App>,
	OptionalRequestId(req_id): OptionalRequestId,
	Json(login): Json<LoginReq>,
) -> GwResult<(StatusCode, Json<ApiResponse<Login>>)> {
	let subject = app.identity.verify_credentials(&login.handle, &login.password).await;

	if let Ok(subject) = subject {
		let pair = app.tokens.issue(subject.subject_id, &subject.handle).await?;
		let login = Login::new(subject.subject_id, &subject.handle, pair);
		let response = ApiResponse::new(login).with_req_id(req_id.unwrap_or_default());
		Ok((StatusCode::OK, Json(response)))
	} else {
		// Slow down credential guessing
		tokio::time::sleep(std::time::Duration::from_secs(1)).await;
		Err(Error::InvalidCredential)
	}
}

/// # POST /api/auth/refresh
#[derive(Deserialize)]
pub struct RefreshReq {
	#[serde(rename = "refreshToken")]
	refresh_token: String,
}

#[derive(Serialize)]
pub struct TokenRes {
	#[serde(rename = "accessToken")]
	access_token: String,
	#[serde(rename = "refreshToken")]
	refresh_token: String,
	#[serde(rename = "expiresIn")]
	expires_in: i64,
}

pub async fn post_refresh(
	State(app): State<App>,
	OptionalRequestId(req_id): OptionalRequestId,
	Json(req): Json<RefreshReq>,
) -> GwResult<(StatusCode, Json<ApiResponse<TokenRes>>)> {
	let pair = app.tokens.rotate(&req.refresh_token).await?;

	let res = TokenRes {
		access_token: pair.access_token.to_string(),
		refresh_token: pair.refresh_token.to_string(),
		expires_in: pair.expires_in,
	};
	let response = ApiResponse::new(res).with_req_id(req_id.unwrap_or_default());
	Ok((StatusCode::OK, Json(response)))
}

/// # POST /api/auth/logout
///
/// Revokes the presented refresh token. Unknown or already-revoked values
/// succeed, so a stale client can always log out.
pub async fn post_logout(
	State(app): State<App>,
	OptionalRequestId(req_id): OptionalRequestId,
	Json(req): Json<RefreshReq>,
) -> GwResult<(StatusCode, Json<ApiResponse<()>>)> {
	app.tokens.revoke(&req.refresh_token).await?;

	let response = ApiResponse::new(()).with_req_id(req_id.unwrap_or_default());
	Ok((StatusCode::OK, Json(response)))
}

/// # GET /api/auth/sessions
///
/// Lists the caller's live refresh sessions. Token values never leave the
/// store; only expiry metadata is exposed.
#[derive(Serialize)]
pub struct Session {
	handle: String,
	#[serde(rename = "expiresAt")]
	expires_at: Timestamp,
}

pub async fn get_sessions(
	State(app): State<App>,
	Auth(auth): Auth,
	OptionalRequestId(req_id): OptionalRequestId,
) -> GwResult<(StatusCode, Json<ApiResponse<Vec<Session>>>)> {
	let records = app.tokens.sessions(auth.subject_id).await?;

	let sessions = records
		.into_iter()
		.map(|record| Session { handle: record.handle.to_string(), expires_at: record.expires_at })
		.collect();
	let response = ApiResponse::new(sessions).with_req_id(req_id.unwrap_or_default());
	Ok((StatusCode::OK, Json(response)))
}

// vim: ts=4

//! Bearer auth middleware
//!
//! Validates the Authorization header against the token manager and attaches
//! an [`Auth`] extension for downstream extractors. Only the token's
//! validity is logged, never its value.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use super::manager::TokenManager;
use crate::extract::Auth;
use crate::prelude::*;

/// Rejects requests without a valid Bearer access token
pub async fn require_auth(
	State(tokens): State<Arc<TokenManager>>,
	mut req: Request,
	next: Next,
) -> Result<Response, Error> {
	let Some(token) = bearer_token(&req) else {
		debug!("missing bearer token on {}", req.uri().path());
		return Err(Error::InvalidCredential);
	};
	let ctx = tokens.validate_access(token)?;
	req.extensions_mut().insert(Auth(ctx));
	Ok(next.run(req).await)
}

/// Attaches [`Auth`] when a valid token is present, passes through otherwise
pub async fn optional_auth(
	State(tokens): State<Arc<TokenManager>>,
	mut req: Request,
	next: Next,
) -> Result<Response, Error> {
	if let Some(token) = bearer_token(&req) {
		if let Ok(ctx) = tokens.validate_access(token) {
			req.extensions_mut().insert(Auth(ctx));
		}
	}
	Ok(next.run(req).await)
}

fn bearer_token(req: &Request) -> Option<&str> {
	req.headers()
		.get(axum::http::header::AUTHORIZATION)?
		.to_str()
		.ok()?
		.strip_prefix("Bearer ")
}

// vim: ts=4

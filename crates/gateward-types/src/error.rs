//! The canonical error type used across the Gateward workspace.
//!
//! Expected conditions (quota exhaustion, bad credentials, lost rotation
//! races) are carried as values all the way to the HTTP boundary, where
//! `IntoResponse` renders the public body. Internal detail never reaches
//! the client.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::time::Duration;

pub type GwResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	/// A quota tier ran out of points for the current window
	QuotaExceeded { tier: Box<str>, retry_after: Duration },
	/// The counter or token store failed or timed out
	StoreUnavailable,
	/// A credential or token value that could not be verified
	InvalidCredential,
	/// The refresh value was consumed by a concurrent rotation
	RotationConflict,
	PermissionDenied,
	NotFound,
	DbError,
	Timeout,
	BadGateway,
	ConfigError(Box<str>),
	Internal(Box<str>),

	// externals
	Io(std::io::Error),
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Error::QuotaExceeded { tier, retry_after } => {
				write!(f, "quota exceeded on tier {} (retry after {:?})", tier, retry_after)
			}
			Error::StoreUnavailable => write!(f, "store unavailable"),
			Error::InvalidCredential => write!(f, "invalid credential"),
			Error::RotationConflict => write!(f, "refresh token already consumed"),
			Error::PermissionDenied => write!(f, "permission denied"),
			Error::NotFound => write!(f, "not found"),
			Error::DbError => write!(f, "database error"),
			Error::Timeout => write!(f, "timeout"),
			Error::BadGateway => write!(f, "bad gateway"),
			Error::ConfigError(msg) => write!(f, "config error: {}", msg),
			Error::Internal(msg) => write!(f, "internal error: {}", msg),
			Error::Io(err) => write!(f, "io error: {}", err),
		}
	}
}

impl std::error::Error for Error {}

fn body(status: StatusCode, message: &str) -> axum::response::Response {
	(status, Json(json!({ "success": false, "message": message }))).into_response()
}

impl IntoResponse for Error {
	fn into_response(self) -> axum::response::Response {
		match self {
			Error::QuotaExceeded { tier, retry_after } => {
				let retry_secs = retry_after.as_secs().max(1);
				let mut response = (
					StatusCode::TOO_MANY_REQUESTS,
					Json(json!({
						"success": false,
						"message": format!("Too many requests, {} rate limit exceeded", tier),
						"retryAfter": retry_secs,
					})),
				)
					.into_response();
				if let Ok(val) = retry_secs.to_string().parse() {
					response.headers_mut().insert("Retry-After", val);
				}
				response
			}
			Error::InvalidCredential | Error::RotationConflict => {
				body(StatusCode::UNAUTHORIZED, "Invalid credentials")
			}
			Error::PermissionDenied => body(StatusCode::FORBIDDEN, "Permission denied"),
			Error::NotFound => body(StatusCode::NOT_FOUND, "Not found"),
			Error::BadGateway => body(StatusCode::BAD_GATEWAY, "Bad gateway"),
			Error::Timeout => body(StatusCode::GATEWAY_TIMEOUT, "Gateway timeout"),
			_ => body(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
		}
	}
}


// vim: ts=4

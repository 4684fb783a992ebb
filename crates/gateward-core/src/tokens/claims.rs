//! Access token claims

use serde::{Deserialize, Serialize};

/// Claims carried by a signed access token. Validation is stateless: the
/// signature and `exp` are all a replica needs.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AccessClaims {
	/// Subject id
	pub sub: u32,
	/// Subject handle, forwarded to downstreams
	pub handle: Box<str>,
	/// Issued at, unix seconds
	pub iat: i64,
	/// Expiry, unix seconds
	pub exp: i64,
}

// vim: ts=4

//! Gateway configuration
//!
//! Plain settings structs handed to the admission controller, the token
//! manager and the dispatcher at construction time. Nothing here is read
//! again after startup.

use std::time::Duration;

use crate::admission::AdmissionConfig;

/// How the gateway learns the client address it accounts requests against
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ServerMode {
	/// Trust the socket peer address
	#[default]
	Standalone,
	/// Trust the forwarding headers set by the edge proxy
	Proxy,
}

/// One forwarding target the dispatcher can route a path prefix to
#[derive(Clone, Debug)]
pub struct DownstreamTarget {
	pub name: Box<str>,
	/// Base URL the matched path suffix is appended to
	pub base_url: Box<str>,
	/// Admission tier requests to this target are charged against
	pub tier: Box<str>,
	pub require_auth: bool,
}

impl DownstreamTarget {
	pub fn new(
		name: impl Into<Box<str>>,
		base_url: impl Into<Box<str>>,
		tier: impl Into<Box<str>>,
		require_auth: bool,
	) -> Self {
		Self {
			name: name.into(),
			base_url: base_url.into(),
			tier: tier.into(),
			require_auth,
		}
	}
}

#[derive(Clone, Debug)]
pub struct GatewaySettings {
	pub mode: ServerMode,
	pub admission: AdmissionConfig,
	/// Access token lifetime in seconds
	pub access_ttl_secs: i64,
	/// Refresh token lifetime in seconds
	pub refresh_ttl_secs: i64,
	/// HS256 key for access tokens. Must not be empty
	pub signing_secret: Box<str>,
	/// Upper bound on any single store call
	pub store_timeout: Duration,
	pub downstreams: Vec<DownstreamTarget>,
}

impl Default for GatewaySettings {
	fn default() -> Self {
		Self {
			mode: ServerMode::Standalone,
			admission: AdmissionConfig::default(),
			access_ttl_secs: 15 * 60,
			refresh_ttl_secs: 7 * 24 * 3600,
			signing_secret: "".into(),
			store_timeout: Duration::from_millis(500),
			downstreams: Vec::new(),
		}
	}
}


// vim: ts=4

//! Client key extraction
//!
//! Resolves the address a request is accounted against. Standalone
//! deployments trust the socket peer; proxy deployments trust the forwarding
//! headers set by the edge, falling back to the peer.

use std::net::{IpAddr, SocketAddr};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::Request;

use gateward_types::types::ClientKey;

use crate::settings::ServerMode;

pub fn extract_client_key(req: &Request<Body>, mode: ServerMode) -> Option<ClientKey> {
	match mode {
		ServerMode::Proxy => header_client_key(req).or_else(|| peer_client_key(req)),
		ServerMode::Standalone => peer_client_key(req),
	}
}

fn header_client_key(req: &Request<Body>) -> Option<ClientKey> {
	// X-Forwarded-For lists the original client first
	let forwarded = req
		.headers()
		.get("x-forwarded-for")
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.split(',').next())
		.and_then(|value| value.trim().parse::<IpAddr>().ok());
	if let Some(ip) = forwarded {
		return Some(ClientKey::from(ip));
	}

	req.headers()
		.get("x-real-ip")
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.trim().parse::<IpAddr>().ok())
		.map(ClientKey::from)
}

fn peer_client_key(req: &Request<Body>) -> Option<ClientKey> {
	req.extensions()
		.get::<ConnectInfo<SocketAddr>>()
		.map(|ConnectInfo(addr)| ClientKey::from(*addr))
}


// vim: ts=4

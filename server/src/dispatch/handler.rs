//! HTTP forwarding to downstream services

use axum::body::Body;
use axum::extract::{Extension, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request, Uri};
use axum::response::Response;
use hyper::body::Incoming;
use hyper_util::{client::legacy::Client, rt::TokioExecutor};
use std::sync::Arc;
use std::time::Duration;

use crate::prelude::*;
use gateward_core::admission::extract_client_key;
use gateward_core::{DownstreamTarget, OptionalAuth};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Headers that should not be forwarded between client and downstream (hop-by-hop)
const HOP_BY_HOP_HEADERS: &[&str] = &[
	"connection",
	"keep-alive",
	"proxy-authenticate",
	"proxy-authorization",
	"te",
	"trailers",
	"transfer-encoding",
	"upgrade",
];

/// Check if a header is a hop-by-hop header that should be stripped
fn is_hop_by_hop(name: &HeaderName) -> bool {
	HOP_BY_HOP_HEADERS.iter().any(|h| name.as_str().eq_ignore_ascii_case(h))
}

/// Build the downstream URI from the target base URL and the matched path suffix
fn build_downstream_uri(target: &DownstreamTarget, original: &Uri) -> GwResult<Uri> {
	let base = target
		.base_url
		.parse::<Uri>()
		.map_err(|e| Error::ConfigError(format!("invalid downstream base URL: {}", e).into()))?;

	// Nested routers hand over the suffix with the mount prefix stripped
	let suffix = if original.path().is_empty() { "/" } else { original.path() };
	let combined = format!("{}{}", base.path().trim_end_matches('/'), suffix);
	let path_and_query = match original.query() {
		Some(query) => format!("{}?{}", combined, query),
		None => combined,
	};
	debug!("dispatch URI: {}{}", base.authority().map(|a| a.as_str()).unwrap_or(""), path_and_query);

	let mut parts = base.into_parts();
	parts.path_and_query = Some(
		path_and_query
			.parse()
			.map_err(|e| Error::Internal(format!("failed to build downstream URI: {}", e).into()))?,
	);
	Uri::from_parts(parts)
		.map_err(|e| Error::Internal(format!("failed to build downstream URI: {}", e).into()))
}

/// Copy non-hop-by-hop headers from source to destination
fn copy_headers(src: &HeaderMap, dst: &mut HeaderMap) {
	for (name, value) in src.iter() {
		if is_hop_by_hop(name) {
			continue;
		}
		dst.append(name.clone(), value.clone());
	}
}

/// Forward a request to the downstream target mounted at this path prefix
pub async fn forward(
	State(app): State<App>,
	Extension(target): Extension<Arc<DownstreamTarget>>,
	OptionalAuth(auth): OptionalAuth,
	req: Request<Body>,
) -> GwResult<Response> {
	let client = extract_client_key(&req, app.settings.mode);
	let downstream_uri = build_downstream_uri(&target, req.uri())?;

	let mut headers = HeaderMap::new();
	copy_headers(req.headers(), &mut headers);

	// The gateway owns these headers; whatever the client sent is dropped
	headers.remove(header::AUTHORIZATION);
	headers.remove(HeaderName::from_static("x-auth-subject"));
	headers.remove(HeaderName::from_static("x-auth-handle"));

	// Identity headers carry the validated subject, not the raw token
	if let Some(auth) = &auth {
		if let Ok(value) = HeaderValue::from_str(&auth.subject_id.to_string()) {
			headers.insert(HeaderName::from_static("x-auth-subject"), value);
		}
		if let Ok(value) = HeaderValue::from_str(&auth.handle) {
			headers.insert(HeaderName::from_static("x-auth-handle"), value);
		}
	}

	// Rewrite Host to the downstream authority
	if let Some(authority) = downstream_uri.authority() {
		if let Ok(value) = HeaderValue::from_str(authority.as_str()) {
			headers.insert(header::HOST, value);
		}
	}

	if let Some(client) = client {
		if let Ok(value) = HeaderValue::from_str(&client.0) {
			headers.insert(HeaderName::from_static("x-forwarded-for"), value);
		}
	}

	let scheme = downstream_uri.scheme_str().unwrap_or("http").to_string();
	let method = req.method().clone();
	let body = req.into_body();

	let mut downstream_req = Request::builder().method(method).uri(downstream_uri);
	if let Some(req_headers) = downstream_req.headers_mut() {
		*req_headers = headers;
	}
	let downstream_req = downstream_req
		.body(body)
		.map_err(|e| Error::Internal(format!("failed to build downstream request: {}", e).into()))?;

	match send_downstream(&scheme, CONNECT_TIMEOUT, READ_TIMEOUT, downstream_req).await {
		Ok(mut resp) => {
			// Strip hop-by-hop headers from the response
			let headers_to_remove: Vec<HeaderName> =
				resp.headers().keys().filter(|name| is_hop_by_hop(name)).cloned().collect();
			for name in headers_to_remove {
				resp.headers_mut().remove(&name);
			}
			Ok(resp.map(Body::new))
		}
		Err(e @ Error::Timeout) => {
			warn!("downstream timeout for {}", target.name);
			Err(e)
		}
		Err(e) => {
			warn!("downstream error for {}: {}", target.name, e);
			Err(e)
		}
	}
}

/// Send a request downstream, choosing HTTP or HTTPS connector based on scheme
async fn send_downstream(
	scheme: &str,
	connect_timeout: Duration,
	timeout: Duration,
	req: Request<Body>,
) -> GwResult<hyper::Response<Incoming>> {
	let result = if scheme == "https" {
		let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
			.with_native_roots()
			.map_err(|_| Error::ConfigError("no native root CA certificates found".into()))?
			.https_only()
			.enable_http1()
			.build();
		let client: Client<_, Body> = Client::builder(TokioExecutor::new())
			.pool_idle_timeout(connect_timeout)
			.build(https_connector);
		tokio::time::timeout(timeout, client.request(req)).await
	} else {
		let http_connector = hyper_util::client::legacy::connect::HttpConnector::new();
		let client: Client<_, Body> = Client::builder(TokioExecutor::new())
			.pool_idle_timeout(connect_timeout)
			.build(http_connector);
		tokio::time::timeout(timeout, client.request(req)).await
	};
	match result {
		Ok(Ok(resp)) => Ok(resp),
		Ok(Err(_)) => Err(Error::BadGateway),
		Err(_) => Err(Error::Timeout),
	}
}


// vim: ts=4

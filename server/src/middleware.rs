//! Custom middlewares

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use uuid::Uuid;

use crate::prelude::*;
use gateward_core::RequestId;

/// Tags every request with an id for response envelopes and log correlation.
/// Only the request line is logged, never headers or bodies.
pub async fn request_context(mut req: Request<Body>, next: Next) -> Response {
	let req_id = Uuid::new_v4().to_string();
	debug!("{} {} [{}]", req.method(), req.uri().path(), req_id);
	req.extensions_mut().insert(RequestId(req_id));
	next.run(req).await
}

// vim: ts=4

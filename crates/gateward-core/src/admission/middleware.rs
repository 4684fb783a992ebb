//! Admission middleware
//!
//! Tower layer that runs the admission controller for one route class before
//! the inner service sees the request.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::Request;
use axum::response::IntoResponse;
use futures::future::BoxFuture;
use tower::{Layer, Service};

use gateward_types::error::Error;

use super::controller::AdmissionController;
use super::extractors::extract_client_key;
use crate::settings::ServerMode;

/// Admission middleware layer
#[derive(Clone)]
pub struct AdmissionLayer {
	controller: Arc<AdmissionController>,
	tier: Arc<str>,
	mode: ServerMode,
}

impl AdmissionLayer {
	pub fn new(
		controller: Arc<AdmissionController>,
		tier: impl Into<Arc<str>>,
		mode: ServerMode,
	) -> Self {
		Self { controller, tier: tier.into(), mode }
	}
}

impl<S> Layer<S> for AdmissionLayer {
	type Service = AdmissionService<S>;

	fn layer(&self, inner: S) -> Self::Service {
		AdmissionService {
			inner,
			controller: self.controller.clone(),
			tier: self.tier.clone(),
			mode: self.mode,
		}
	}
}

/// Admission middleware service
#[derive(Clone)]
pub struct AdmissionService<S> {
	inner: S,
	controller: Arc<AdmissionController>,
	tier: Arc<str>,
	mode: ServerMode,
}

impl<S> Service<Request<Body>> for AdmissionService<S>
where
	S: Service<Request<Body>, Response = axum::response::Response> + Clone + Send + 'static,
	S::Future: Send + 'static,
{
	type Response = S::Response;
	type Error = S::Error;
	type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, req: Request<Body>) -> Self::Future {
		let controller = self.controller.clone();
		let tier = self.tier.clone();
		let mode = self.mode;
		let mut inner = self.inner.clone();

		Box::pin(async move {
			if let Some(client) = extract_client_key(&req, mode) {
				match controller.admit(&client, &tier).await {
					Ok(decision) if !decision.allowed => {
						let error = Error::QuotaExceeded {
							tier: decision.tier,
							retry_after: decision.retry_after.unwrap_or_default(),
						};
						return Ok(error.into_response());
					}
					Ok(_) => {}
					Err(error) => return Ok(error.into_response()),
				}
			}

			inner.call(req).await
		})
	}
}

// vim: ts=4

use axum::{
	middleware::{from_fn, from_fn_with_state},
	routing::{get, post},
	Extension, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app::App;
use crate::middleware::request_context;
use crate::{auth, dispatch};
use gateward_core::tokens::{optional_auth, require_auth};
use gateward_core::AdmissionLayer;

fn init_auth(app: &App) -> Router<App> {
	let mode = app.settings.mode;

	Router::new()
		.route("/api/auth/login", post(auth::handler::post_login))
		.route("/api/auth/refresh", post(auth::handler::post_refresh))
		.route("/api/auth/logout", post(auth::handler::post_logout))
		.merge(
			Router::new()
				.route("/api/auth/sessions", get(auth::handler::get_sessions))
				.layer(from_fn_with_state(app.tokens.clone(), require_auth)),
		)
		.layer(AdmissionLayer::new(app.admission.clone(), "auth", mode))
}

fn init_dispatch(app: &App) -> Router<App> {
	let mode = app.settings.mode;
	let mut router = Router::new();

	for target in &app.settings.downstreams {
		let target = Arc::new(target.clone());
		let name = target.name.clone();

		let forward = Router::new()
			.fallback(dispatch::handler::forward)
			.layer(Extension(target.clone()));
		let forward = if target.require_auth {
			forward.layer(from_fn_with_state(app.tokens.clone(), require_auth))
		} else {
			forward.layer(from_fn_with_state(app.tokens.clone(), optional_auth))
		};
		let forward = forward.layer(AdmissionLayer::new(app.admission.clone(), &*target.tier, mode));

		router = router.nest(&format!("/{}", name), forward);
	}

	router
}

pub fn init(app: App) -> Router {
	Router::new()
		.merge(init_auth(&app))
		.merge(init_dispatch(&app))
		.layer(from_fn(request_context))
		.layer(TraceLayer::new_for_http())
		.layer(CorsLayer::permissive())
		.with_state(app)
}

// vim: ts=4

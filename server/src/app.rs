//! App state type

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::prelude::*;
use crate::routes;

use gateward_core::{AdmissionController, GatewaySettings, TokenManager};
use gateward_types::counter_adapter::CounterAdapter;
use gateward_types::identity_adapter::IdentityAdapter;
use gateward_types::token_adapter::TokenAdapter;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How often expired refresh records are purged from the store
const PURGE_INTERVAL: Duration = Duration::from_secs(3600);

pub struct AppState {
	pub settings: GatewaySettings,
	pub admission: Arc<AdmissionController>,
	pub tokens: Arc<TokenManager>,
	pub identity: Arc<dyn IdentityAdapter>,
}

pub type App = Arc<AppState>;

pub struct Adapters {
	pub counter_adapter: Option<Arc<dyn CounterAdapter>>,
	pub token_adapter: Option<Arc<dyn TokenAdapter>>,
	pub identity_adapter: Option<Arc<dyn IdentityAdapter>>,
}

pub struct AppBuilder {
	settings: GatewaySettings,
	listen: Box<str>,
	adapters: Adapters,
}

impl AppBuilder {
	pub fn new() -> Self {
		AppBuilder {
			settings: GatewaySettings::default(),
			listen: "127.0.0.1:8080".into(),
			adapters: Adapters {
				counter_adapter: None,
				token_adapter: None,
				identity_adapter: None,
			},
		}
	}

	// Opts
	pub fn settings(&mut self, settings: GatewaySettings) -> &mut Self { self.settings = settings; self }
	pub fn listen(&mut self, listen: impl Into<Box<str>>) -> &mut Self { self.listen = listen.into(); self }

	// Adapters
	pub fn counter_adapter(&mut self, counter_adapter: Arc<dyn CounterAdapter>) -> &mut Self { self.adapters.counter_adapter = Some(counter_adapter); self }
	pub fn token_adapter(&mut self, token_adapter: Arc<dyn TokenAdapter>) -> &mut Self { self.adapters.token_adapter = Some(token_adapter); self }
	pub fn identity_adapter(&mut self, identity_adapter: Arc<dyn IdentityAdapter>) -> &mut Self { self.adapters.identity_adapter = Some(identity_adapter); self }

	/// Assembles the shared state without binding a listener
	pub fn build(self) -> GwResult<App> {
		let counter_adapter = self
			.adapters
			.counter_adapter
			.ok_or(Error::ConfigError("no counter adapter".into()))?;
		let token_adapter = self
			.adapters
			.token_adapter
			.ok_or(Error::ConfigError("no token adapter".into()))?;
		let identity_adapter = self
			.adapters
			.identity_adapter
			.ok_or(Error::ConfigError("no identity adapter".into()))?;

		let admission = Arc::new(AdmissionController::new(counter_adapter, &self.settings));
		let tokens = Arc::new(TokenManager::new(token_adapter, &self.settings)?);

		Ok(Arc::new(AppState {
			settings: self.settings,
			admission,
			tokens,
			identity: identity_adapter,
		}))
	}

	pub async fn run(self) -> GwResult<()> {
		tracing_subscriber::fmt()
			.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
			.with_target(false)
			.init();
		info!("            _                             _");
		info!("  __ _ __ _| |_ _____      ____ _ _ __ __| |");
		info!(" / _` / _` | __/ _ \\ \\ /\\ / / _` | '__/ _` |");
		info!("| (_| (_| | ||  __/\\ V  V / (_| | | | (_| |");
		info!(" \\__, \\__,_|\\__\\___| \\_/\\_/ \\__,_|_|  \\__,_|");
		info!(" |___/");
		info!("V{}", VERSION);
		info!("");

		let listen = self.listen.clone();
		let app = self.build()?;
		run(app, &listen).await
	}
}

impl Default for AppBuilder {
	fn default() -> Self { Self::new() }
}

/// Serves the gateway on `listen` until the listener fails
pub async fn run(app: App, listen: &str) -> GwResult<()> {
	// Expired refresh records only waste space, so a slow cadence is enough
	let purge_app = app.clone();
	tokio::spawn(async move {
		let mut ticker = tokio::time::interval(PURGE_INTERVAL);
		loop {
			ticker.tick().await;
			match purge_app.tokens.purge_expired().await {
				Ok(0) => {}
				Ok(purged) => info!("purged {} expired refresh records", purged),
				Err(err) => warn!("refresh record purge failed: {}", err),
			}
		}
	});

	let router = routes::init(app);
	let listener = tokio::net::TcpListener::bind(listen).await?;
	info!("Listening on {}", listen);
	axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>()).await?;

	Ok(())
}

// vim: ts=4

//! Minimal Gateward deployment
//!
//! In-memory counters, an SQLite token store and a single environment-defined
//! user. Enough to front one downstream on a dev box.

use async_trait::async_trait;
use std::sync::Arc;
use std::{env, path};

use gateward::identity_adapter::{IdentityAdapter, Subject};
use gateward::prelude::*;
use gateward::{AppBuilder, DownstreamTarget, GatewaySettings};
use gateward_counter_adapter_memory::CounterAdapterMemory;
use gateward_token_adapter_sqlite::TokenAdapterSqlite;

pub struct Config {
	pub db_dir: path::PathBuf,
	pub listen: String,
}

#[derive(Debug)]
struct SingleUserIdentity {
	handle: Box<str>,
	password: Box<str>,
}

#[async_trait]
impl IdentityAdapter for SingleUserIdentity {
	async fn verify_credentials(&self, handle: &str, password: &str) -> GwResult<Subject> {
		if handle == &*self.handle && password == &*self.password {
			Ok(Subject { subject_id: SubjectId(1), handle: self.handle.clone() })
		} else {
			Err(Error::InvalidCredential)
		}
	}
}

#[tokio::main]
async fn main() {
	let config = Config {
		db_dir: path::PathBuf::from(env::var("DB_DIR").unwrap_or("./data".to_string())),
		listen: env::var("LISTEN").unwrap_or("127.0.0.1:8080".to_string()),
	};

	std::fs::create_dir_all(&config.db_dir).expect("Cannot create db dir");
	let token_adapter =
		Arc::new(TokenAdapterSqlite::new(config.db_dir.join("tokens.db")).await.unwrap());
	let identity_adapter = Arc::new(SingleUserIdentity {
		handle: env::var("GATEWAY_USER").unwrap_or("admin".to_string()).into(),
		password: env::var("GATEWAY_PASSWORD").unwrap_or("admin".to_string()).into(),
	});

	let settings = GatewaySettings {
		signing_secret: env::var("SIGNING_SECRET")
			.unwrap_or("dev-secret-change-me".to_string())
			.into(),
		downstreams: vec![DownstreamTarget::new(
			"app",
			env::var("DOWNSTREAM_URL").unwrap_or("http://127.0.0.1:3000".to_string()),
			"global",
			false,
		)],
		..GatewaySettings::default()
	};

	let mut builder = AppBuilder::new();
	builder
		.settings(settings)
		.listen(config.listen)
		.counter_adapter(Arc::new(CounterAdapterMemory::new()))
		.token_adapter(token_adapter)
		.identity_adapter(identity_adapter);
	builder.run().await.unwrap();
}

// vim: ts=4

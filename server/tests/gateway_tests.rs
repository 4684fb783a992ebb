//! End-to-end gateway tests
//!
//! Drives the full router: admission denial over budget, login and refresh
//! rotation, session handling and header rewriting on dispatch.

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

use gateward::{routes, AppBuilder, DownstreamTarget, GatewaySettings};
use gateward_core::admission::{AdmissionConfig, FailPolicy, TierConfig};
use gateward_counter_adapter_memory::CounterAdapterMemory;
use gateward_token_adapter_sqlite::TokenAdapterSqlite;
use gateward_types::error::{Error, GwResult};
use gateward_types::identity_adapter::{IdentityAdapter, Subject};
use gateward_types::types::SubjectId;

#[derive(Debug)]
struct StubIdentity;

#[async_trait]
impl IdentityAdapter for StubIdentity {
	async fn verify_credentials(&self, handle: &str, password: &str) -> GwResult<Subject> {
		if handle == "alice" && password == "sesame" {
			Ok(Subject { subject_id: SubjectId(1), handle: "alice".into() })
		} else {
			Err(Error::InvalidCredential)
		}
	}
}

fn test_settings() -> GatewaySettings {
	GatewaySettings {
		signing_secret: "0123456789abcdef0123456789abcdef".into(),
		..GatewaySettings::default()
	}
}

async fn create_test_gateway(settings: GatewaySettings) -> (Router, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let token_adapter = TokenAdapterSqlite::new(temp_dir.path().join("tokens.db"))
		.await
		.expect("Failed to create token adapter");

	let mut builder = AppBuilder::new();
	builder
		.settings(settings)
		.counter_adapter(Arc::new(CounterAdapterMemory::new()))
		.token_adapter(Arc::new(token_adapter))
		.identity_adapter(Arc::new(StubIdentity));
	let app = builder.build().expect("Failed to build app");

	(routes::init(app), temp_dir)
}

async fn echo_headers(headers: HeaderMap) -> Json<Value> {
	Json(json!({
		"authSubject": headers.get("x-auth-subject").and_then(|v| v.to_str().ok()),
		"authHandle": headers.get("x-auth-handle").and_then(|v| v.to_str().ok()),
		"hasAuthorization": headers.contains_key("authorization"),
		"forwardedFor": headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()),
	}))
}

async fn spawn_downstream() -> SocketAddr {
	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	let router = Router::new()
		.route("/ping", get(|| async { "pong" }))
		.route("/echo", get(echo_headers));
	tokio::spawn(async move {
		axum::serve(listener, router).await.unwrap();
	});
	addr
}

fn peer() -> SocketAddr {
	"127.0.0.1:40001".parse().unwrap()
}

fn json_request(method: &str, path: &str, body: Value) -> Request<Body> {
	Request::builder()
		.method(method)
		.uri(path)
		.header(header::CONTENT_TYPE, "application/json")
		.extension(ConnectInfo(peer()))
		.body(Body::from(body.to_string()))
		.unwrap()
}

fn get_request(path: &str, bearer: Option<&str>) -> Request<Body> {
	let mut builder = Request::builder().method("GET").uri(path).extension(ConnectInfo(peer()));
	if let Some(token) = bearer {
		builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
	}
	builder.body(Body::empty()).unwrap()
}

async fn read_json(resp: Response) -> Value {
	let bytes = resp.into_body().collect().await.unwrap().to_bytes();
	serde_json::from_slice(&bytes).unwrap()
}

async fn login(router: &Router) -> (String, String) {
	let req =
		json_request("POST", "/api/auth/login", json!({ "handle": "alice", "password": "sesame" }));
	let resp = router.clone().oneshot(req).await.unwrap();
	assert_eq!(resp.status(), StatusCode::OK);
	let body = read_json(resp).await;
	(
		body["data"]["accessToken"].as_str().unwrap().to_string(),
		body["data"]["refreshToken"].as_str().unwrap().to_string(),
	)
}

#[tokio::test]
async fn test_login_issues_token_pair() {
	let (router, _temp) = create_test_gateway(test_settings()).await;

	let req =
		json_request("POST", "/api/auth/login", json!({ "handle": "alice", "password": "sesame" }));
	let resp = router.oneshot(req).await.unwrap();
	assert_eq!(resp.status(), StatusCode::OK);

	let body = read_json(resp).await;
	assert_eq!(body["success"], json!(true));
	assert_eq!(body["data"]["subjectId"], json!(1));
	assert_eq!(body["data"]["handle"], json!("alice"));
	assert_eq!(body["data"]["expiresIn"], json!(900));
	assert!(!body["data"]["accessToken"].as_str().unwrap().is_empty());
	assert_eq!(body["data"]["refreshToken"].as_str().unwrap().len(), 80);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
	let (router, _temp) = create_test_gateway(test_settings()).await;

	let req =
		json_request("POST", "/api/auth/login", json!({ "handle": "alice", "password": "wrong" }));
	let resp = router.oneshot(req).await.unwrap();
	assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sessions_require_access_token() {
	let (router, _temp) = create_test_gateway(test_settings()).await;
	let (access, _refresh) = login(&router).await;

	let resp = router.clone().oneshot(get_request("/api/auth/sessions", None)).await.unwrap();
	assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

	let resp =
		router.clone().oneshot(get_request("/api/auth/sessions", Some(&access))).await.unwrap();
	assert_eq!(resp.status(), StatusCode::OK);
	let body = read_json(resp).await;
	assert_eq!(body["data"].as_array().unwrap().len(), 1);
	assert_eq!(body["data"][0]["handle"], json!("alice"));
}

#[tokio::test]
async fn test_each_login_is_a_separate_session() {
	let (router, _temp) = create_test_gateway(test_settings()).await;
	let (access, _refresh) = login(&router).await;
	let (_access2, _refresh2) = login(&router).await;

	let resp =
		router.clone().oneshot(get_request("/api/auth/sessions", Some(&access))).await.unwrap();
	assert_eq!(resp.status(), StatusCode::OK);
	let body = read_json(resp).await;
	assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_refresh_rotation_is_single_use() {
	let (router, _temp) = create_test_gateway(test_settings()).await;
	let (_access, refresh) = login(&router).await;

	let req = json_request("POST", "/api/auth/refresh", json!({ "refreshToken": refresh }));
	let resp = router.clone().oneshot(req).await.unwrap();
	assert_eq!(resp.status(), StatusCode::OK);
	let body = read_json(resp).await;
	let rotated = body["data"]["refreshToken"].as_str().unwrap().to_string();
	assert_ne!(rotated, refresh);

	// The consumed value is dead for every later caller
	let req = json_request("POST", "/api/auth/refresh", json!({ "refreshToken": refresh }));
	let resp = router.clone().oneshot(req).await.unwrap();
	assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

	// The rotated value works
	let req = json_request("POST", "/api/auth/refresh", json!({ "refreshToken": rotated }));
	let resp = router.clone().oneshot(req).await.unwrap();
	assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
	let (router, _temp) = create_test_gateway(test_settings()).await;
	let (_access, refresh) = login(&router).await;

	let req = json_request("POST", "/api/auth/logout", json!({ "refreshToken": refresh }));
	let resp = router.clone().oneshot(req).await.unwrap();
	assert_eq!(resp.status(), StatusCode::OK);

	let req = json_request("POST", "/api/auth/refresh", json!({ "refreshToken": refresh }));
	let resp = router.clone().oneshot(req).await.unwrap();
	assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

	// Logout again succeeds for stale clients
	let req = json_request("POST", "/api/auth/logout", json!({ "refreshToken": refresh }));
	let resp = router.clone().oneshot(req).await.unwrap();
	assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_expired_refresh_token_is_rejected() {
	let mut settings = test_settings();
	settings.refresh_ttl_secs = 1;
	let (router, _temp) = create_test_gateway(settings).await;
	let (_access, refresh) = login(&router).await;

	tokio::time::sleep(Duration::from_secs(2)).await;

	let req = json_request("POST", "/api/auth/refresh", json!({ "refreshToken": refresh }));
	let resp = router.clone().oneshot(req).await.unwrap();
	assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admission_denies_over_budget() {
	let addr = spawn_downstream().await;
	let mut settings = test_settings();
	settings.admission = AdmissionConfig {
		global: TierConfig::new("global", Duration::from_secs(900), 3, FailPolicy::Open),
		tiers: vec![TierConfig::new("auth", Duration::from_secs(900), 50, FailPolicy::Closed)],
	};
	settings.downstreams =
		vec![DownstreamTarget::new("svc", format!("http://{}", addr), "global", false)];
	let (router, _temp) = create_test_gateway(settings).await;

	for _ in 0..3 {
		let resp = router.clone().oneshot(get_request("/svc/ping", None)).await.unwrap();
		assert_eq!(resp.status(), StatusCode::OK);
	}

	let resp = router.clone().oneshot(get_request("/svc/ping", None)).await.unwrap();
	assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
	assert!(resp.headers().contains_key("Retry-After"));
	let body = read_json(resp).await;
	assert_eq!(body["success"], json!(false));
	assert!(body["message"].as_str().unwrap().contains("global"));
	let retry_after = body["retryAfter"].as_u64().unwrap();
	assert!(retry_after >= 1 && retry_after <= 900);
}

#[tokio::test]
async fn test_forwarding_sets_identity_headers() {
	let addr = spawn_downstream().await;
	let mut settings = test_settings();
	settings.downstreams =
		vec![DownstreamTarget::new("svc", format!("http://{}", addr), "global", false)];
	let (router, _temp) = create_test_gateway(settings).await;
	let (access, _refresh) = login(&router).await;

	let resp = router.clone().oneshot(get_request("/svc/echo", Some(&access))).await.unwrap();
	assert_eq!(resp.status(), StatusCode::OK);
	let body = read_json(resp).await;
	assert_eq!(body["authSubject"], json!("1"));
	assert_eq!(body["authHandle"], json!("alice"));
	// The raw token never crosses to the downstream
	assert_eq!(body["hasAuthorization"], json!(false));
	assert_eq!(body["forwardedFor"], json!("127.0.0.1"));
}

#[tokio::test]
async fn test_forwarding_strips_spoofed_identity_headers() {
	let addr = spawn_downstream().await;
	let mut settings = test_settings();
	settings.downstreams =
		vec![DownstreamTarget::new("svc", format!("http://{}", addr), "global", false)];
	let (router, _temp) = create_test_gateway(settings).await;

	let req = Request::builder()
		.method("GET")
		.uri("/svc/echo")
		.header("x-auth-subject", "99")
		.header("x-auth-handle", "mallory")
		.extension(ConnectInfo(peer()))
		.body(Body::empty())
		.unwrap();
	let resp = router.clone().oneshot(req).await.unwrap();
	assert_eq!(resp.status(), StatusCode::OK);
	let body = read_json(resp).await;
	assert_eq!(body["authSubject"], json!(null));
	assert_eq!(body["authHandle"], json!(null));
}

#[tokio::test]
async fn test_protected_target_requires_auth() {
	let addr = spawn_downstream().await;
	let mut settings = test_settings();
	settings.downstreams =
		vec![DownstreamTarget::new("svc", format!("http://{}", addr), "global", true)];
	let (router, _temp) = create_test_gateway(settings).await;
	let (access, _refresh) = login(&router).await;

	let resp = router.clone().oneshot(get_request("/svc/ping", None)).await.unwrap();
	assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

	let resp = router.clone().oneshot(get_request("/svc/ping", Some(&access))).await.unwrap();
	assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unreachable_downstream_is_bad_gateway() {
	let mut settings = test_settings();
	settings.downstreams =
		vec![DownstreamTarget::new("svc", "http://127.0.0.1:1", "global", false)];
	let (router, _temp) = create_test_gateway(settings).await;

	let resp = router.clone().oneshot(get_request("/svc/ping", None)).await.unwrap();
	assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}

// vim: ts=4

#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::Value;
use tower::ServiceExt;

use project_management_api::config::{AppConfig, SyncMode};
use project_management_api::database::models::{Project, User, UserProfile, Workspace};
use project_management_api::database::{DatabaseError, MemoryStore, Store, Upserted};
use project_management_api::webhooks::WebhookVerifier;
use project_management_api::{app, AppState};

pub const SIGNING_KEY_PEM: &str = include_str!("../fixtures/session_signing_key.pem");
pub const PUBLIC_KEY_PEM: &str = include_str!("../fixtures/session_public_key.pem");

/// base64("clerk.example.test$")
pub const PUBLISHABLE_KEY: &str = "pk_test_Y2xlcmsuZXhhbXBsZS50ZXN0JA==";
pub const ISSUER: &str = "https://clerk.example.test";

/// base64("integration-webhook-secret")
pub const WEBHOOK_SECRET: &str = "whsec_aW50ZWdyYXRpb24td2ViaG9vay1zZWNyZXQ=";

/// Development config with session verification and webhook signing switched on
pub fn test_config(mode: SyncMode) -> AppConfig {
    let mut config = AppConfig::development();
    config.api.enable_request_logging = false;
    config.security.jwt_key = Some(PUBLIC_KEY_PEM.to_string());
    config.security.publishable_key = Some(PUBLISHABLE_KEY.to_string());
    config.webhook.signing_secret = Some(WEBHOOK_SECRET.to_string());
    config.webhook.sync_mode = mode;
    config
}

pub fn router(config: AppConfig, store: Arc<dyn Store>) -> Router {
    let state = AppState::new(config, store).expect("valid test state");
    app(state)
}

/// Router over a fresh in-memory store; the store is returned for assertions
pub fn memory_app(mode: SyncMode) -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (router(test_config(mode), store.clone()), store)
}

pub fn sign_session(claims: &Value) -> String {
    let key = EncodingKey::from_rsa_pem(SIGNING_KEY_PEM.as_bytes()).expect("test signing key");
    jsonwebtoken::encode(&Header::new(Algorithm::RS256), claims, &key).expect("sign test token")
}

pub fn session_claims(sub: &str) -> Value {
    let now = chrono::Utc::now().timestamp();
    serde_json::json!({
        "sub": sub,
        "sid": "sess_test",
        "iss": ISSUER,
        "iat": now,
        "nbf": now - 5,
        "exp": now + 300,
    })
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("request failed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response should be valid JSON")
    };
    (status, body)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// A webhook delivery signed with `WEBHOOK_SECRET`
pub fn signed_webhook(payload: &Value) -> Request<Body> {
    signed_webhook_at(payload, chrono::Utc::now().timestamp())
}

/// Same as `signed_webhook`, with an explicit signing timestamp
pub fn signed_webhook_at(payload: &Value, timestamp: i64) -> Request<Body> {
    let body = payload.to_string();
    let msg_id = format!("msg_{}", uuid::Uuid::new_v4().simple());
    let verifier = WebhookVerifier::new(WEBHOOK_SECRET, 300).unwrap();
    let signature = verifier.sign(&msg_id, timestamp, body.as_bytes()).unwrap();

    Request::builder()
        .method("POST")
        .uri("/api/webhooks/identity")
        .header("content-type", "application/json")
        .header("svix-id", msg_id)
        .header("svix-timestamp", timestamp.to_string())
        .header("svix-signature", signature)
        .body(Body::from(body))
        .unwrap()
}

pub fn user_event(event_type: &str, id: &str, first: &str, last: &str, email: &str) -> Value {
    serde_json::json!({
        "type": event_type,
        "object": "event",
        "data": {
            "id": id,
            "object": "user",
            "email_addresses": [{ "id": "idn_1", "email_address": email }],
            "first_name": first,
            "last_name": last,
            "image_url": format!("https://img.example.test/{}.png", id)
        }
    })
}

pub fn deleted_event(id: &str) -> Value {
    serde_json::json!({
        "type": "user.deleted",
        "object": "event",
        "data": { "id": id, "object": "user", "deleted": true }
    })
}

/// Store whose every call fails as if the database were unreachable
pub struct UnreachableStore;

fn unreachable() -> DatabaseError {
    DatabaseError::ConnectionError("connection refused".to_string())
}

#[async_trait]
impl Store for UnreachableStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Err(unreachable())
    }
    async fn find_user(&self, _id: &str) -> Result<Option<User>, DatabaseError> {
        Err(unreachable())
    }
    async fn insert_user(&self, _profile: &UserProfile) -> Result<User, DatabaseError> {
        Err(unreachable())
    }
    async fn update_user(&self, _profile: &UserProfile) -> Result<Option<User>, DatabaseError> {
        Err(unreachable())
    }
    async fn upsert_user(&self, _profile: &UserProfile) -> Result<Upserted, DatabaseError> {
        Err(unreachable())
    }
    async fn delete_user(&self, _id: &str) -> Result<bool, DatabaseError> {
        Err(unreachable())
    }
    async fn list_workspaces(&self) -> Result<Vec<Workspace>, DatabaseError> {
        Err(unreachable())
    }
    async fn list_projects(&self) -> Result<Vec<Project>, DatabaseError> {
        Err(unreachable())
    }
}

// Spawned-binary server

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    /// Start the built binary on a free port and wait until it answers `GET /`
    pub async fn start() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // An empty DATABASE_URL selects the in-memory store
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_project-management-api"));
        cmd.env("PORT", port.to_string())
            .env("HOST", "127.0.0.1")
            .env("APP_ENV", "development")
            .env("DATABASE_URL", "")
            .env("RUST_LOG", "warn")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;
        let server = Self { port, base_url, child };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = client.get(format!("{}/", self.base_url)).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

//! Stub DrDrive backend for integration tests.
//!
//! Runs an axum router on an ephemeral port. Credentials drive the outcome:
//!
//! - `alice` / `correct`: success with token `T2`
//! - `alice` / anything else: 401 `{"error":"bad credentials"}`
//! - `mallory`: 200 with `success: false`
//! - `garbage`: 200 with a non-JSON body
//! - `slow`: success after a delay
//!
//! Bearer tokens `T2`, `T3` and `R1` are accepted by `/profile` and `/generate`.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use drdrive_core::storage::{KeyValueStore, MemoryStore};
use drdrive_core::ApiClient;

/// Memory store that fails on chosen keys while failures are switched on.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_get: Option<&'static str>,
    pub fail_set: Option<&'static str>,
    pub fail_remove: Option<&'static str>,
    pub healthy: AtomicBool,
}

impl FlakyStore {
    /// Turn the configured failures off (`true`) or back on (`false`)
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    fn fails(&self, configured: Option<&str>, key: &str) -> bool {
        !self.healthy.load(Ordering::SeqCst) && configured == Some(key)
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        if self.fails(self.fail_get, key) {
            anyhow::bail!("keychain locked");
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        if self.fails(self.fail_set, key) {
            anyhow::bail!("disk full");
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        if self.fails(self.fail_remove, key) {
            anyhow::bail!("permission denied");
        }
        self.inner.remove(key)
    }
}

pub const VALID_TOKENS: [&str; 3] = ["T2", "T3", "R1"];

#[derive(Clone, Default)]
struct Recorded {
    registrations: Arc<Mutex<Vec<Value>>>,
    profile_updates: Arc<Mutex<Vec<Value>>>,
}

pub struct Backend {
    pub base_url: String,
    recorded: Recorded,
    handle: JoinHandle<()>,
}

impl Drop for Backend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl Backend {
    pub fn client(&self) -> ApiClient {
        ApiClient::new(self.base_url.clone(), Duration::from_secs(5)).expect("build client")
    }

    pub fn registrations(&self) -> Vec<Value> {
        self.recorded.registrations.lock().unwrap().clone()
    }

    pub fn profile_updates(&self) -> Vec<Value> {
        self.recorded.profile_updates.lock().unwrap().clone()
    }
}

pub async fn start_backend() -> Backend {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/api/login", post(login))
        .route("/api/register", post(register))
        .route("/api/profile", put(profile))
        .route("/api/generate", post(generate))
        .with_state(recorded.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind 127.0.0.1:0");
    let addr = listener.local_addr().expect("local addr");
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("stub backend error: {e:?}");
        }
    });

    Backend {
        base_url: format!("http://{addr}/api"),
        recorded,
        handle,
    }
}

fn alice() -> Value {
    json!({ "id": 1, "username": "alice" })
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Invalid token" }))).into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    match (username, password) {
        ("alice", "correct") => Json(json!({ "success": true, "token": "T2", "user": alice() })).into_response(),
        ("alice", _) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "error": "bad credentials" })),
        )
            .into_response(),
        ("mallory", _) => Json(json!({ "success": false, "error": "account locked" })).into_response(),
        ("garbage", _) => (StatusCode::OK, "definitely not json").into_response(),
        ("slow", _) => {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Json(json!({ "success": true, "token": "T2", "user": { "id": 9, "username": "slow" } }))
                .into_response()
        }
        _ => (StatusCode::NOT_FOUND, Json(json!({ "error": "User not found" }))).into_response(),
    }
}

async fn register(State(recorded): State<Recorded>, Json(body): Json<Value>) -> Response {
    recorded.registrations.lock().unwrap().push(body.clone());

    match body["username"].as_str().unwrap_or_default() {
        "taken" => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "Username already exists" })),
        )
            .into_response(),
        "nomsg" => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response(),
        username => {
            let mut user = json!({ "id": 42, "username": username, "email": body["email"] });
            for field in ["phone", "year", "make", "model", "chassis"] {
                if let Some(value) = body.get(field) {
                    user[field] = value.clone();
                }
            }
            Json(json!({ "success": true, "token": "R1", "user": user })).into_response()
        }
    }
}

async fn profile(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let Some(token) = bearer(&headers).filter(|t| VALID_TOKENS.contains(t)) else {
        return unauthorized();
    };
    recorded.profile_updates.lock().unwrap().push(body.clone());

    if body["email"] == "taken@example.com" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Email already in use" })),
        )
            .into_response();
    }

    // T2 is rotated on update, other tokens are kept
    if token == "T2" {
        Json(json!({ "success": true, "token": "T3" })).into_response()
    } else {
        Json(json!({ "success": true })).into_response()
    }
}

async fn generate(headers: HeaderMap, mut multipart: Multipart) -> Response {
    if !bearer(&headers).is_some_and(|t| VALID_TOKENS.contains(&t)) {
        return unauthorized();
    }

    let mut prompt = String::new();
    let mut images = Vec::new();
    while let Some(field) = multipart.next_field().await.expect("multipart field") {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("prompt") => prompt = field.text().await.expect("prompt text"),
            Some("images") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.expect("image bytes");
                images.push(format!("{file_name} {content_type} {}", bytes.len()));
            }
            _ => {}
        }
    }

    Json(json!({
        "success": true,
        "prompt": prompt,
        "response": format!("Check the coolant level. images: [{}]", images.join(", ")),
    }))
    .into_response()
}

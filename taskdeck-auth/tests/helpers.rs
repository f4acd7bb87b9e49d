//! Stub identity server for session tests

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use taskdeck_auth::{CredentialStore, MemoryTokenStorage, SessionService};
use taskdeck_core::TaskdeckConfig;
use tokio::net::TcpListener;

pub const ADMIN_EMAIL: &str = "admin@clickup-api.com";
pub const ADMIN_PASSWORD: &str = "Admin123!";

#[derive(Clone, Default)]
pub struct StubState {
    pub hits: Arc<AtomicUsize>,
}

/// Running stub server
pub struct TestIdentity {
    pub address: String,
    pub state: StubState,
}

impl TestIdentity {
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> TaskdeckConfig {
        let mut config = TaskdeckConfig::default();
        config.api.base_url = self.address.clone();
        config.api.timeout_seconds = 5;
        config
    }

    /// Session over an in-memory slot, optionally pre-seeded with a token
    pub fn session(&self, stored: Option<&str>) -> (SessionService, Arc<MemoryTokenStorage>) {
        let storage = Arc::new(match stored {
            Some(token) => MemoryTokenStorage::with_token(token),
            None => MemoryTokenStorage::new(),
        });
        let store = Arc::new(CredentialStore::new(storage.clone()));
        let session = SessionService::new(&self.config(), store).expect("session service");
        (session, storage)
    }
}

fn user(id: &str, email: &str, role: &str) -> Value {
    json!({ "id": id, "email": email, "role": role })
}

async fn login(State(state): State<StubState>, Json(body): Json<Value>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);

    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    match (email, password) {
        (ADMIN_EMAIL, ADMIN_PASSWORD) => Json(json!({
            "access_token": "admin-token",
            "user": user("1", ADMIN_EMAIL, "ADMIN"),
        }))
        .into_response(),
        ("silent@example.com", _) => StatusCode::UNAUTHORIZED.into_response(),
        (_, "wrong-password") => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Account is locked" })),
        )
            .into_response(),
        (email, _) => Json(json!({
            "access_token": format!("token-for-{}", email),
            "user": user("2", email, "VIEWER"),
        }))
        .into_response(),
    }
}

async fn register(State(state): State<StubState>, Json(body): Json<Value>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);

    let email = body["email"].as_str().unwrap_or_default();
    let role = body["role"].as_str().unwrap_or("VIEWER");

    match email {
        "taken@example.com" => (
            StatusCode::CONFLICT,
            Json(json!({ "message": ["Email already exists", "ignored"] })),
        )
            .into_response(),
        "broken@example.com" => StatusCode::BAD_REQUEST.into_response(),
        _ => (
            StatusCode::CREATED,
            Json(json!({
                "access_token": "registered-token",
                "user": user("3", email, role),
            })),
        )
            .into_response(),
    }
}

async fn profile(State(state): State<StubState>, headers: HeaderMap) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);

    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    match auth {
        "Bearer admin-token" => Json(user("1", ADMIN_EMAIL, "ADMIN")).into_response(),
        "Bearer flaky-token" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Unauthorized" })),
        )
            .into_response(),
    }
}

pub async fn spawn_identity() -> TestIdentity {
    let state = StubState::default();

    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/profile", get(profile))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    TestIdentity {
        address: format!("http://127.0.0.1:{}", port),
        state,
    }
}

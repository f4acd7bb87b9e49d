//! Stub identity + resource server for client tests

use axum::{
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use taskdeck_api::{AuthenticatedClient, ResourceApi};
use taskdeck_auth::{CredentialStore, RouteState, SessionService};
use taskdeck_core::TaskdeckConfig;
use tokio::net::TcpListener;

pub const ADMIN_EMAIL: &str = "admin@clickup-api.com";
pub const ADMIN_PASSWORD: &str = "Admin123!";

/// Tokens the stub accepts on resource routes
const VALID_TOKENS: [&str; 3] = ["admin-token", "editor-token", "viewer-token"];

#[derive(Clone, Default)]
pub struct StubState {
    pub hits: Arc<AtomicUsize>,
    pub authorizations: Arc<Mutex<Vec<Option<String>>>>,
    pub queries: Arc<Mutex<Vec<Option<String>>>>,
    pub paths: Arc<Mutex<Vec<String>>>,
}

impl StubState {
    fn record(&self, uri: &Uri, headers: &HeaderMap, query: Option<String>) -> Option<String> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        self.paths.lock().unwrap().push(uri.path().to_string());
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.authorizations.lock().unwrap().push(auth.clone());
        self.queries.lock().unwrap().push(query);
        auth
    }
}

fn authorized(auth: &Option<String>) -> bool {
    auth.as_deref()
        .and_then(|a| a.strip_prefix("Bearer "))
        .is_some_and(|t| VALID_TOKENS.contains(&t))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Unauthorized" })),
    )
        .into_response()
}

async fn login(State(state): State<StubState>, Json(body): Json<Value>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);

    let email = body["email"].as_str().unwrap_or_default().to_string();
    let (token, role) = match email.as_str() {
        ADMIN_EMAIL => ("admin-token", "ADMIN"),
        "editor@example.com" => ("editor-token", "EDITOR"),
        "viewer@example.com" => ("viewer-token", "VIEWER"),
        _ => return unauthorized(),
    };

    Json(json!({
        "access_token": token,
        "user": { "id": "1", "email": email, "role": role },
    }))
    .into_response()
}

async fn workspaces(State(state): State<StubState>, uri: Uri, headers: HeaderMap) -> Response {
    let auth = state.record(&uri, &headers, None);
    if !authorized(&auth) {
        return unauthorized();
    }

    Json(json!({
        "teams": [
            { "id": "9001", "name": "Acme", "color": "#7b68ee", "members": [] }
        ]
    }))
    .into_response()
}

async fn spaces(
    State(state): State<StubState>,
    Path(workspace_id): Path<String>,
    RawQuery(query): RawQuery,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let auth = state.record(&uri, &headers, query);
    if !authorized(&auth) {
        return unauthorized();
    }

    Json(json!({
        "spaces": [
            { "id": format!("{}-s1", workspace_id), "name": "Engineering", "private": false }
        ]
    }))
    .into_response()
}

async fn current_user(State(state): State<StubState>, uri: Uri, headers: HeaderMap) -> Response {
    let auth = state.record(&uri, &headers, None);
    if !authorized(&auth) {
        return unauthorized();
    }

    Json(json!({
        "user": {
            "id": 42,
            "username": "admin",
            "email": ADMIN_EMAIL,
            "initials": "AD"
        }
    }))
    .into_response()
}

async fn members(
    State(state): State<StubState>,
    Path(workspace_id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let auth = state.record(&uri, &headers, None);
    if !authorized(&auth) {
        return unauthorized();
    }
    if workspace_id != "9001" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Workspace not found" })),
        )
            .into_response();
    }

    Json(json!({
        "members": [
            { "id": 42, "username": "admin", "email": ADMIN_EMAIL, "role": 1 },
            { "id": 7, "username": "dana", "role": 3 }
        ]
    }))
    .into_response()
}

async fn space(
    State(state): State<StubState>,
    Path(space_id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let auth = state.record(&uri, &headers, None);
    if !authorized(&auth) {
        return unauthorized();
    }

    Json(json!({
        "id": space_id,
        "name": "Engineering",
        "private": true,
        "statuses": [
            { "status": "open", "type": "open", "orderindex": 0 },
            { "status": "done", "type": "closed", "orderindex": 1 }
        ]
    }))
    .into_response()
}

async fn lists_by_space(
    State(state): State<StubState>,
    Path(space_id): Path<String>,
    RawQuery(query): RawQuery,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let auth = state.record(&uri, &headers, query);
    if !authorized(&auth) {
        return unauthorized();
    }

    Json(json!({
        "lists": [
            { "id": "l1", "name": format!("Backlog of {}", space_id), "task_count": 3 },
            { "id": "l2", "name": "Sprint", "task_count": 0 }
        ]
    }))
    .into_response()
}

async fn list(
    State(state): State<StubState>,
    Path(list_id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let auth = state.record(&uri, &headers, None);
    if !authorized(&auth) {
        return unauthorized();
    }

    Json(json!({
        "id": list_id,
        "name": "Backlog",
        "task_count": 3,
        "priority": { "priority": "high", "color": "#f50000" },
        "assignee": { "id": 7, "username": "dana" }
    }))
    .into_response()
}

async fn tasks_by_list(
    State(state): State<StubState>,
    Path(list_id): Path<String>,
    RawQuery(query): RawQuery,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let auth = state.record(&uri, &headers, query);
    if !authorized(&auth) {
        return unauthorized();
    }

    Json(json!({
        "tasks": [{
            "id": "t1",
            "name": format!("First task in {}", list_id),
            "status": { "status": "open", "color": "#d3d3d3", "type": "open" },
            "assignees": [{ "id": 7, "username": "dana" }],
            "unknown_field": true
        }]
    }))
    .into_response()
}

async fn task(
    State(state): State<StubState>,
    Path(task_id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let auth = state.record(&uri, &headers, None);

    match task_id.as_str() {
        // answers late, after the caller may have started a new session
        "slow-unauthorized" => {
            tokio::time::sleep(Duration::from_millis(300)).await;
            unauthorized()
        }
        "boom" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "Upstream unavailable" })),
        )
            .into_response(),
        _ if !authorized(&auth) => unauthorized(),
        "missing" => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Task not found" })),
        )
            .into_response(),
        id => Json(json!({
            "id": id,
            "name": "Write docs",
            "status": { "status": "in progress" }
        }))
        .into_response(),
    }
}

/// Running stub server
pub struct TestServer {
    pub address: String,
    pub state: StubState,
}

/// Fully wired client stack against the stub
pub struct TestApp {
    pub session: Arc<SessionService>,
    pub navigator: Arc<RouteState>,
    pub api: ResourceApi,
}

impl TestServer {
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn authorizations(&self) -> Vec<Option<String>> {
        self.state.authorizations.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<Option<String>> {
        self.state.queries.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.state.paths.lock().unwrap().clone()
    }

    pub fn app(&self) -> TestApp {
        app_for(&self.address)
    }
}

pub fn app_for(address: &str) -> TestApp {
    let mut config = TaskdeckConfig::default();
    config.api.base_url = address.to_string();
    config.api.timeout_seconds = 5;

    let credentials = Arc::new(CredentialStore::in_memory());
    let session = Arc::new(SessionService::new(&config, credentials).expect("session"));
    let navigator = Arc::new(RouteState::default());
    let client = AuthenticatedClient::new(&config, session.clone(), navigator.clone())
        .expect("client");

    TestApp {
        session,
        navigator,
        api: ResourceApi::new(Arc::new(client)),
    }
}

pub async fn spawn_server() -> TestServer {
    let state = StubState::default();

    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/api/users/workspaces", get(workspaces))
        .route("/api/users/me", get(current_user))
        .route("/api/users/workspace/{id}/members", get(members))
        .route("/api/spaces/workspace/{id}", get(spaces))
        .route("/api/spaces/{id}", get(space))
        .route("/api/lists/space/{id}", get(lists_by_space))
        .route("/api/lists/{id}", get(list))
        .route("/api/tasks/list/{id}", get(tasks_by_list))
        .route("/api/tasks/{id}", get(task))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    TestServer {
        address: format!("http://127.0.0.1:{}", port),
        state,
    }
}

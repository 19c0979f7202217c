/// Common test utilities for integration tests
///
/// Builds the full router over an in-process store, so these tests need no
/// database. Requests go straight into the router via `tower::Service`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tasklane_api::app::{build_router, AppState};
use tasklane_api::config::Config;
use tasklane_shared::auth::password::PasswordParams;
use tasklane_shared::store::MemoryStore;
use tower::Service as _;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// Test context containing the router and its store
pub struct TestContext {
    pub app: axum::Router,
    pub store: Arc<MemoryStore>,
    pub config: Config,
}

impl TestContext {
    /// Creates a new test context over an empty store
    pub fn new() -> Self {
        let vars: HashMap<String, String> = [
            ("STORAGE_BACKEND", "memory"),
            ("JWT_SECRET", TEST_SECRET),
            ("JWT_TTL_HOURS", "1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let mut config = Config::from_vars(vars).expect("test config");
        // Production Argon2 costs would dominate test time
        config.password = PasswordParams::insecure_fast();

        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), config.clone());

        TestContext {
            app: build_router(state),
            store,
            config,
        }
    }

    /// Sends a request and returns the status and JSON body (`Null` if empty)
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send("GET", uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        self.send("POST", uri, token, body).await
    }

    /// Registers `username` and logs in, returning the access token
    pub async fn register_and_login(&self, username: &str) -> String {
        let password = "correct horse battery";

        let (status, body) = self
            .post(
                "/register",
                None,
                Some(serde_json::json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": password,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        let (status, body) = self
            .post(
                "/login",
                None,
                Some(serde_json::json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        body["access_token"].as_str().unwrap().to_string()
    }

    /// Creates a task and returns its id
    pub async fn create_task(&self, token: &str, title: &str) -> String {
        let (status, body) = self
            .post(
                "/tasks",
                Some(token),
                Some(serde_json::json!({ "title": title })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);

        body["id"].as_str().unwrap().to_string()
    }
}

/// Titles of the tasks in one view of a `GET /` response
pub fn titles(views: &Value, view: &str) -> Vec<String> {
    views[view]
        .as_array()
        .map(|tasks| {
            tasks
                .iter()
                .filter_map(|t| t["title"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

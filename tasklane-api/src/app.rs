//! Application state and router builder
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tasklane_api::{app::{build_router, AppState}, config::Config};
//! use tasklane_shared::store::MemoryStore;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let state = AppState::new(Arc::new(MemoryStore::new()), config);
//! let app = build_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

use crate::{config::Config, error::ApiError};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tasklane_shared::{auth::session, store::Store};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Built once in `main` and cloned into each handler by axum's `State`
/// extractor. Both fields are `Arc`s, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Account, task and revocation storage
    pub store: Arc<dyn Store>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET  /health
/// ├── POST /register
/// ├── POST /login
/// ├── POST /logout                  (auth)
/// ├── GET  /                        (auth) incomplete / completed / archived
/// └── /tasks                        (auth)
///     ├── POST /
///     ├── GET  /:id
///     └── POST /:id/{toggle,archive,restore,delete,edit}
/// ```
///
/// Every request passes through [`resolve_session`], which attaches an
/// `AuthContext`. Routes marked (auth) take the `RequireUser` extractor.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let task_routes = Router::new()
        .route("/", post(routes::tasks::create_task))
        .route("/:id", get(routes::tasks::get_task))
        .route("/:id/toggle", post(routes::tasks::toggle_task))
        .route("/:id/archive", post(routes::tasks::archive_task))
        .route("/:id/restore", post(routes::tasks::restore_task))
        .route("/:id/delete", post(routes::tasks::delete_task))
        .route("/:id/edit", post(routes::tasks::edit_task));

    let cors = cors_layer(&state.config.api.cors_origins);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout))
        .route("/", get(routes::tasks::list_tasks))
        .nest("/tasks", task_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            resolve_session,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Session middleware
///
/// Resolves the `Authorization` header into an `AuthContext` request
/// extension. Bad tokens become `Anonymous`; only a storage failure stops
/// the request here.
async fn resolve_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let auth_context = session::resolve_bearer(
        authorization,
        state.jwt_secret(),
        state.store.as_users(),
        state.store.as_revocations(),
    )
    .await?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_builds_for_both_modes() {
        let _ = cors_layer(&["*".to_string()]);
        let _ = cors_layer(&[
            "https://app.example".to_string(),
            "not a header value\n".to_string(),
        ]);
    }
}

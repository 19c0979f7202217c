//! Health check endpoint
//!
//! ```text
//! GET /health
//! ```
//!
//! ```json
//! {
//!   "status": "healthy",
//!   "version": "0.1.0",
//!   "storage": "postgres",
//!   "storage_status": "connected"
//! }
//! ```

use crate::app::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,

    /// Application version
    pub version: String,

    /// Storage backend name
    pub storage: String,

    /// "connected" or "disconnected"
    pub storage_status: String,
}

/// Health check handler
///
/// Answers 200 when storage responds and 503 otherwise, with the same body
/// shape either way.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (code, status, storage_status) = match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "healthy", "connected"),
        Err(e) => {
            warn!(error = %e, "Storage health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "disconnected")
        }
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            storage: state.store.backend().to_string(),
            storage_status: storage_status.to_string(),
        }),
    )
}

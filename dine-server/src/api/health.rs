//! Health check endpoint

use axum::{Json, extract::State, http::StatusCode};

use crate::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let (status, store) = match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!(error = %e, "Health check: store unreachable");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };
    (
        status,
        Json(serde_json::json!({
            "status": if status.is_success() { "ok" } else { "degraded" },
            "service": "dine-server",
            "version": env!("CARGO_PKG_VERSION"),
            "git_hash": option_env!("GIT_HASH").unwrap_or("dev"),
            "store": store,
        })),
    )
}

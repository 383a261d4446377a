//! Session maintenance endpoints

use axum::{Extension, Json, extract::State};
use serde_json::{Value, json};
use shared::models::SessionCleanupReport;

use crate::auth::StaffIdentity;
use crate::error::ServiceResult;
use crate::state::AppState;

/// POST /api/staff/maintenance/sessions/cleanup-expired
pub async fn cleanup_expired(
    State(state): State<AppState>,
    Extension(staff): Extension<StaffIdentity>,
) -> ServiceResult<Json<Value>> {
    let removed = state.sessions.cleanup_expired().await?;
    tracing::info!(user_id = staff.user_id, removed, "Expired session cleanup requested");
    Ok(Json(json!({ "removed": removed })))
}

/// POST /api/staff/maintenance/sessions/cleanup-problematic
pub async fn cleanup_problematic(
    State(state): State<AppState>,
    Extension(staff): Extension<StaffIdentity>,
) -> ServiceResult<Json<SessionCleanupReport>> {
    let report = state.sessions.cleanup_problematic().await?;
    tracing::info!(
        user_id = staff.user_id,
        cleaned = report.cleaned,
        "Problematic session cleanup requested"
    );
    Ok(Json(report))
}

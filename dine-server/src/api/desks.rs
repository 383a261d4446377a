//! Desk (table) endpoints for staff

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde_json::{Value, json};
use shared::models::{Desk, DeskCreate, DeskRelease, DeskStatusUpdate, DeskUpdate, DeskView};

use super::extract::ValidJson;
use crate::auth::StaffIdentity;
use crate::error::ServiceResult;
use crate::state::AppState;

/// GET /api/staff/desks - 获取所有桌台及占用状态
pub async fn list(
    State(state): State<AppState>,
    Extension(staff): Extension<StaffIdentity>,
) -> ServiceResult<Json<Vec<DeskView>>> {
    Ok(Json(state.desks.list_with_status(staff.shop_id).await?))
}

/// GET /api/staff/desks/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Extension(staff): Extension<StaffIdentity>,
    Path(id): Path<i64>,
) -> ServiceResult<Json<DeskView>> {
    Ok(Json(state.desks.get(staff.shop_id, id).await?))
}

/// POST /api/staff/desks - 创建桌台
pub async fn create(
    State(state): State<AppState>,
    Extension(staff): Extension<StaffIdentity>,
    ValidJson(payload): ValidJson<DeskCreate>,
) -> ServiceResult<Json<Desk>> {
    Ok(Json(state.desks.create(staff.shop_id, payload).await?))
}

/// PATCH /api/staff/desks/{id} - 更新桌台
pub async fn update(
    State(state): State<AppState>,
    Extension(staff): Extension<StaffIdentity>,
    Path(id): Path<i64>,
    ValidJson(payload): ValidJson<DeskUpdate>,
) -> ServiceResult<Json<Desk>> {
    Ok(Json(state.desks.update(staff.shop_id, id, payload).await?))
}

/// DELETE /api/staff/desks/{id} - 删除桌台
pub async fn delete(
    State(state): State<AppState>,
    Extension(staff): Extension<StaffIdentity>,
    Path(id): Path<i64>,
) -> ServiceResult<Json<bool>> {
    Ok(Json(state.desks.delete(staff.shop_id, id).await?))
}

/// PATCH /api/staff/desks/{id}/status - 手动切换状态
pub async fn toggle_status(
    State(state): State<AppState>,
    Extension(staff): Extension<StaffIdentity>,
    Path(id): Path<i64>,
    ValidJson(payload): ValidJson<DeskStatusUpdate>,
) -> ServiceResult<Json<DeskView>> {
    let view = state
        .desks
        .toggle_status(staff.shop_id, id, payload.status)
        .await?;
    Ok(Json(view))
}

/// POST /api/staff/desks/{id}/release - 结账并释放桌台
pub async fn release(
    State(state): State<AppState>,
    Extension(staff): Extension<StaffIdentity>,
    Path(id): Path<i64>,
) -> ServiceResult<Json<DeskRelease>> {
    Ok(Json(state.desks.complete_and_pay(staff.shop_id, id).await?))
}

/// POST /api/staff/desks/{id}/reset - 重置桌台会话
pub async fn reset(
    State(state): State<AppState>,
    Extension(staff): Extension<StaffIdentity>,
    Path(id): Path<i64>,
) -> ServiceResult<Json<Value>> {
    let expired = state.desks.reset_table(staff.shop_id, id).await?;
    Ok(Json(json!({ "expired_sessions": expired })))
}

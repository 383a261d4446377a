//! Order endpoints

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{Order, OrderDetail, OrderStatusUpdate};

use super::extract::ValidJson;
use crate::auth::{SessionContext, StaffIdentity};
use crate::error::ServiceResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

/// GET /api/orders/session - 本会话未结账订单
pub async fn for_session(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> ServiceResult<Json<Vec<OrderDetail>>> {
    let session = ctx.session();
    if session.is_fallback() {
        return Ok(Json(Vec::new()));
    }
    let orders = state
        .orders
        .list_for_session(session.shop_id, &session.id)
        .await?;
    Ok(Json(orders))
}

/// GET /api/staff/orders?status=
pub async fn list(
    State(state): State<AppState>,
    Extension(staff): Extension<StaffIdentity>,
    Query(query): Query<ListQuery>,
) -> ServiceResult<Json<Vec<OrderDetail>>> {
    let status = query.status.as_deref().filter(|s| !s.is_empty());
    Ok(Json(state.orders.list(staff.shop_id, status).await?))
}

/// GET /api/staff/orders/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Extension(staff): Extension<StaffIdentity>,
    Path(id): Path<i64>,
) -> ServiceResult<Json<OrderDetail>> {
    Ok(Json(state.orders.get(staff.shop_id, id).await?))
}

/// PATCH /api/staff/orders/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Extension(staff): Extension<StaffIdentity>,
    Path(id): Path<i64>,
    ValidJson(payload): ValidJson<OrderStatusUpdate>,
) -> ServiceResult<Json<Order>> {
    let order = state
        .orders
        .update_status(staff.shop_id, id, &payload.status)
        .await?;
    Ok(Json(order))
}

/// GET /api/staff/customers/{id}/orders
pub async fn for_customer(
    State(state): State<AppState>,
    Extension(staff): Extension<StaffIdentity>,
    Path(customer_id): Path<i64>,
) -> ServiceResult<Json<Vec<OrderDetail>>> {
    let orders = state
        .orders
        .list_for_customer(staff.shop_id, customer_id)
        .await?;
    Ok(Json(orders))
}

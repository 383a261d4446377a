//! Cart endpoints
//!
//! Reads accept any resolved session; writes need a persisted one.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde_json::{Value, json};
use shared::models::{
    CartItem, CartItemAdd, CartQuantityUpdate, CartSummary, CheckoutRequest, OrderDetail,
};

use super::extract::ValidJson;
use crate::auth::SessionContext;
use crate::error::ServiceResult;
use crate::state::AppState;

/// GET /api/cart
pub async fn view(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> ServiceResult<Json<CartSummary>> {
    if ctx.session().is_fallback() {
        return Ok(Json(CartSummary::default()));
    }
    Ok(Json(state.cart.view(ctx.session()).await?))
}

/// POST /api/cart
pub async fn add(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    ValidJson(payload): ValidJson<CartItemAdd>,
) -> ServiceResult<Json<CartItem>> {
    let session = ctx.writable()?;
    Ok(Json(state.cart.add(session, payload).await?))
}

/// PATCH /api/cart/{id}
pub async fn update_quantity(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<i64>,
    ValidJson(payload): ValidJson<CartQuantityUpdate>,
) -> ServiceResult<Json<Option<CartItem>>> {
    let session = ctx.writable()?;
    let line = state
        .cart
        .update_quantity(session, id, payload.quantity)
        .await?;
    Ok(Json(line))
}

/// DELETE /api/cart/{id}
pub async fn remove(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<i64>,
) -> ServiceResult<Json<bool>> {
    let session = ctx.writable()?;
    state.cart.remove(session, id).await?;
    Ok(Json(true))
}

/// DELETE /api/cart
pub async fn clear(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> ServiceResult<Json<Value>> {
    let session = ctx.writable()?;
    let removed = state.cart.clear(session).await?;
    Ok(Json(json!({ "removed": removed })))
}

/// POST /api/cart/checkout
pub async fn checkout(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    payload: Option<ValidJson<CheckoutRequest>>,
) -> ServiceResult<Json<OrderDetail>> {
    let session = ctx.writable()?;
    let req = payload.map(|ValidJson(req)| req).unwrap_or_default();
    Ok(Json(state.cart.checkout(session, req).await?))
}

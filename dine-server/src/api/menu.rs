//! Menu browsing endpoints (fallback sessions allowed)

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;
use shared::models::{Category, MenuItem};

use crate::auth::SessionContext;
use crate::error::ServiceResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ItemsQuery {
    pub category_id: Option<i64>,
}

/// GET /api/menu/categories
pub async fn categories(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> ServiceResult<Json<Vec<Category>>> {
    let categories = state.menu.list_categories(ctx.session().shop_id).await?;
    Ok(Json(categories))
}

/// GET /api/menu/items?category_id=
pub async fn items(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Query(query): Query<ItemsQuery>,
) -> ServiceResult<Json<Vec<MenuItem>>> {
    let items = state
        .menu
        .list_items(ctx.session().shop_id, query.category_id)
        .await?;
    Ok(Json(items))
}

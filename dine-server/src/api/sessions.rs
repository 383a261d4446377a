//! Ordering session endpoints

use axum::{Extension, Json, extract::State};
use shared::models::{Session, SessionCreate};

use super::extract::ValidJson;
use crate::auth::SessionContext;
use crate::error::ServiceResult;
use crate::state::AppState;

/// POST /api/sessions - 进入桌台（复用或新建会话）
pub async fn start(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<SessionCreate>,
) -> ServiceResult<Json<Session>> {
    let session = if payload.force_new {
        state.sessions.create(payload).await?
    } else {
        state
            .sessions
            .get_or_create(&payload.table_number, payload.shop_id)
            .await?
    };
    Ok(Json(session))
}

/// GET /api/sessions/current - 当前会话
pub async fn current(Extension(ctx): Extension<SessionContext>) -> Json<Session> {
    Json(ctx.session().clone())
}

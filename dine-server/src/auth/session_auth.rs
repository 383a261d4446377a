//! Customer session middleware
//!
//! Resolves `X-Session-Id` into a [`SessionContext`] request extension.
//! `X-Table-Number`, when sent, must match the session's table.
//! `X-Shop-Id` is only a hint used to label a fallback session.
//!
//! [`session_middleware`] admits live sessions only. The order-history
//! route uses [`session_orders_middleware`], which also admits a session
//! already completed by checkout.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::{AppError, ErrorCode};
use shared::models::Session;

use crate::sessions::SessionLookup;
use crate::state::AppState;

pub const SESSION_HEADER: &str = "x-session-id";
pub const TABLE_HEADER: &str = "x-table-number";
pub const SHOP_HINT_HEADER: &str = "x-shop-id";

/// The caller's ordering session
#[derive(Debug, Clone)]
pub struct SessionContext(pub SessionLookup);

impl SessionContext {
    /// Any resolved session, fallback included (read routes)
    pub fn session(&self) -> &Session {
        self.0.session()
    }

    /// A persisted session (write routes)
    pub fn writable(&self) -> Result<&Session, AppError> {
        match &self.0 {
            SessionLookup::Active(session) => Ok(session),
            SessionLookup::Fallback(session) => Err(AppError::new(ErrorCode::SessionReadOnly)
                .with_detail("session_id", session.id.clone())),
            SessionLookup::Closed(session) => {
                Err(AppError::session_not_found(session.id.clone()))
            }
        }
    }
}

fn header<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

pub async fn session_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    resolve(state, request, next, false).await
}

pub async fn session_orders_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    resolve(state, request, next, true).await
}

async fn resolve(
    state: AppState,
    mut request: Request,
    next: Next,
    allow_completed: bool,
) -> Result<Response, AppError> {
    let session_id = header(&request, SESSION_HEADER)
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::SessionNotFound, "Missing X-Session-Id header")
        })?
        .to_string();
    let table = header(&request, TABLE_HEADER).map(str::to_string);
    let shop_hint = header(&request, SHOP_HINT_HEADER).and_then(|v| v.parse::<i64>().ok());

    let lookup = if allow_completed {
        state
            .sessions
            .lookup_with_completed(&session_id, shop_hint)
            .await
    } else {
        state.sessions.lookup(&session_id, shop_hint).await
    };
    let lookup = lookup
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::session_not_found(session_id.clone()))?;

    let lookup = match lookup {
        SessionLookup::Fallback(mut session) => {
            // Legacy ids carry no table; trust the header for display only
            if session.table_number.is_empty()
                && let Some(table) = &table
            {
                session.table_number = table.clone();
            }
            SessionLookup::Fallback(session)
        }
        active => active,
    };

    if let Some(table) = &table
        && *table != lookup.session().table_number
    {
        tracing::debug!(session_id = %session_id, supplied = %table, "Session table mismatch");
        return Err(AppError::table_mismatch(
            lookup.session().table_number.clone(),
            table.clone(),
        ));
    }

    if matches!(lookup, SessionLookup::Active(_))
        && let Err(e) = state.sessions.update_activity(&session_id).await
    {
        let e = AppError::from(e);
        tracing::warn!(session_id = %session_id, error = %e, "Session heartbeat failed");
    }

    request.extensions_mut().insert(SessionContext(lookup));
    Ok(next.run(request).await)
}

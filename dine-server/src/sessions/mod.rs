//! Session Manager
//!
//! Anonymous per-table ordering sessions: the identity customers use
//! instead of logging in.
//!
//! Cache use is best-effort throughout. A store outage while *reading* a
//! session degrades to a synthetic [`SessionLookup::Fallback`]; a store
//! outage on any write is an error for the caller.

pub mod id;

use serde_json::json;
use shared::error::{AppError, ErrorCode};
use shared::models::{Session, SessionCleanupReport, SessionCreate, SessionStatus};
use shared::util::now_millis;

use crate::cache::{CacheLayer, session_key};
use crate::config::{MAX_SESSION_HOURS, MIN_SESSION_HOURS};
use crate::db::{DynStore, StoreError};
use crate::error::ServiceResult;

pub use id::{extract_table_number, generate_id, is_valid_table_number, validate};

const HOUR_MS: i64 = 3_600_000;
const ID_ATTEMPTS: usize = 3;

/// Outcome of a session lookup
#[derive(Debug, Clone, PartialEq)]
pub enum SessionLookup {
    /// Persisted, active and unexpired
    Active(Session),
    /// Synthesized while the store was unreachable; read-only
    Fallback(Session),
    /// Completed by checkout; only its orders remain readable
    Closed(Session),
}

impl SessionLookup {
    pub fn session(&self) -> &Session {
        match self {
            SessionLookup::Active(s) | SessionLookup::Fallback(s) | SessionLookup::Closed(s) => s,
        }
    }

    pub fn into_session(self) -> Session {
        match self {
            SessionLookup::Active(s) | SessionLookup::Fallback(s) | SessionLookup::Closed(s) => s,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, SessionLookup::Fallback(_))
    }
}

#[derive(Clone)]
pub struct SessionManager {
    store: DynStore,
    cache: CacheLayer,
    default_hours: i64,
    cache_ttl_secs: u64,
}

impl SessionManager {
    pub fn new(
        store: DynStore,
        cache: CacheLayer,
        default_hours: i64,
        cache_ttl_secs: u64,
    ) -> Self {
        Self {
            store,
            cache,
            default_hours: default_hours.clamp(MIN_SESSION_HOURS, MAX_SESSION_HOURS),
            cache_ttl_secs,
        }
    }

    /// Persist a new active session (`force_new` is not consulted here)
    pub async fn create(&self, req: SessionCreate) -> ServiceResult<Session> {
        if !is_valid_table_number(&req.table_number) {
            return Err(AppError::with_message(
                ErrorCode::InvalidTableNumber,
                format!("invalid table number '{}'", req.table_number),
            )
            .into());
        }
        let hours = req.expiration_hours.unwrap_or(self.default_hours);
        if !(MIN_SESSION_HOURS..=MAX_SESSION_HOURS).contains(&hours) {
            return Err(AppError::with_message(
                ErrorCode::ValueOutOfRange,
                format!(
                    "expiration_hours must be between {MIN_SESSION_HOURS} and {MAX_SESSION_HOURS}"
                ),
            )
            .with_detail("expiration_hours", hours)
            .into());
        }
        let metadata = match req.metadata {
            Some(value @ serde_json::Value::Object(_)) => value,
            Some(serde_json::Value::Null) | None => json!({}),
            Some(_) => return Err(AppError::validation("metadata must be a JSON object").into()),
        };
        if self.store.get_shop(req.shop_id).await?.is_none() {
            return Err(AppError::new(ErrorCode::ShopNotFound)
                .with_detail("shop_id", req.shop_id)
                .into());
        }

        let now = now_millis();
        let mut session = Session {
            id: String::new(),
            table_number: req.table_number,
            desk_id: None,
            shop_id: req.shop_id,
            status: SessionStatus::Active,
            created_at: now,
            last_activity: now,
            expires_at: now + hours * HOUR_MS,
            metadata,
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            session.id = generate_id(&session.table_number);
            match self.store.insert_session(&session).await {
                Ok(()) => break,
                Err(StoreError::Duplicate(_)) if attempt < ID_ATTEMPTS => {
                    tracing::warn!(session_id = %session.id, "Session id collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::info!(
            session_id = %session.id,
            shop_id = session.shop_id,
            table = %session.table_number,
            "Session created"
        );
        self.cache
            .set_json(&session_key(&session.id), &session, self.cache_ttl_secs)
            .await;
        Ok(session)
    }

    /// Look up an active session
    pub async fn get(&self, id: &str) -> ServiceResult<Option<SessionLookup>> {
        self.lookup(id, None).await
    }

    /// Look up an active session. `shop_hint` is only used to build a
    /// fallback session when the store is unreachable.
    pub async fn lookup(
        &self,
        id: &str,
        shop_hint: Option<i64>,
    ) -> ServiceResult<Option<SessionLookup>> {
        if !validate(id) {
            return Err(AppError::with_message(ErrorCode::SessionInvalid, "Malformed session id")
                .with_detail("session_id", id)
                .into());
        }

        let now = now_millis();
        let key = session_key(id);
        if let Some(cached) = self.cache.get_json::<Session>(&key).await {
            if cached.is_live(now) {
                return Ok(Some(SessionLookup::Active(cached)));
            }
            self.cache.invalidate(&key).await;
        }

        match self.store.find_live_session(id, now).await {
            Ok(Some(session)) => {
                self.cache
                    .set_json(&key, &session, self.cache_ttl_secs)
                    .await;
                Ok(Some(SessionLookup::Active(session)))
            }
            Ok(None) => Ok(None),
            Err(e) if e.is_unavailable() => {
                tracing::warn!(
                    session_id = id,
                    error = %e,
                    "Store unreachable, serving fallback session"
                );
                let session = self.fallback_session(id, shop_hint, now);
                Ok(Some(SessionLookup::Fallback(session)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Like [`lookup`](Self::lookup), but a session completed by checkout
    /// still resolves, as [`SessionLookup::Closed`]
    pub async fn lookup_with_completed(
        &self,
        id: &str,
        shop_hint: Option<i64>,
    ) -> ServiceResult<Option<SessionLookup>> {
        if let Some(found) = self.lookup(id, shop_hint).await? {
            return Ok(Some(found));
        }
        let closed = self
            .store
            .find_session(id)
            .await?
            .filter(|s| s.status == SessionStatus::Completed);
        Ok(closed.map(SessionLookup::Closed))
    }

    fn fallback_session(&self, id: &str, shop_hint: Option<i64>, now: i64) -> Session {
        Session {
            id: id.to_string(),
            table_number: extract_table_number(id).unwrap_or_default().to_string(),
            desk_id: None,
            shop_id: shop_hint.unwrap_or_default(),
            status: SessionStatus::Active,
            created_at: now,
            last_activity: now,
            expires_at: now + self.default_hours * HOUR_MS,
            metadata: json!({ "fallback": true }),
        }
    }

    /// Heartbeat. `false` when the session is missing or no longer active.
    pub async fn update_activity(&self, id: &str) -> ServiceResult<bool> {
        let now = now_millis();
        let touched = self.store.touch_session(id, now).await?;
        let key = session_key(id);
        if touched && let Some(mut cached) = self.cache.get_json::<Session>(&key).await {
            cached.last_activity = now;
            self.cache.set_json(&key, &cached, self.cache_ttl_secs).await;
        }
        Ok(touched)
    }

    /// Reuse the table's most recently active live session, or create one
    pub async fn get_or_create(&self, table_number: &str, shop_id: i64) -> ServiceResult<Session> {
        let now = now_millis();
        if let Some(mut session) = self
            .store
            .latest_live_session(shop_id, table_number, now)
            .await?
        {
            if self.store.touch_session(&session.id, now).await? {
                session.last_activity = now;
            }
            tracing::debug!(session_id = %session.id, "Reusing live session");
            return Ok(session);
        }
        self.create(SessionCreate {
            table_number: table_number.to_string(),
            shop_id,
            expiration_hours: None,
            force_new: false,
            metadata: None,
        })
        .await
    }

    /// Mark a session completed after its order was placed
    pub async fn complete(&self, id: &str) -> ServiceResult<bool> {
        let updated = self
            .store
            .set_session_status(id, SessionStatus::Completed)
            .await?;
        self.cache.invalidate(&session_key(id)).await;
        Ok(updated)
    }

    /// Delete sessions past expiry or marked expired
    pub async fn cleanup_expired(&self) -> ServiceResult<u64> {
        let ids = self.store.delete_expired_sessions(now_millis()).await?;
        for id in &ids {
            self.cache.invalidate(&session_key(id)).await;
        }
        if !ids.is_empty() {
            tracing::info!(count = ids.len(), "Expired sessions removed");
        }
        Ok(ids.len() as u64)
    }

    /// Expire (without deleting) every active session of a table
    pub async fn reset_table_sessions(
        &self,
        table_number: &str,
        shop_id: i64,
    ) -> ServiceResult<u64> {
        let ids = self
            .store
            .expire_table_sessions(shop_id, table_number)
            .await?;
        for id in &ids {
            self.cache.invalidate(&session_key(id)).await;
        }
        tracing::info!(shop_id, table = table_number, count = ids.len(), "Table sessions reset");
        Ok(ids.len() as u64)
    }

    /// Delete sessions with a malformed id, an invalid table number, or that
    /// are still active past their expiry
    pub async fn cleanup_problematic(&self) -> ServiceResult<SessionCleanupReport> {
        let now = now_millis();
        let mut report = SessionCleanupReport::default();

        for session in self.store.list_sessions().await? {
            let Some(reason) = problem_with(&session, now) else {
                continue;
            };
            match self.store.delete_session(&session.id).await {
                Ok(_) => {
                    self.cache.invalidate(&session_key(&session.id)).await;
                    tracing::debug!(session_id = %session.id, reason, "Problematic session removed");
                    report.cleaned += 1;
                }
                Err(e) => {
                    report.errors.push(format!("{}: {reason}: {e}", session.id));
                }
            }
        }

        tracing::info!(
            cleaned = report.cleaned,
            errors = report.errors.len(),
            "Problematic session sweep finished"
        );
        Ok(report)
    }
}

fn problem_with(session: &Session, now: i64) -> Option<&'static str> {
    if !validate(&session.id) {
        return Some("malformed id");
    }
    if !is_valid_table_number(&session.table_number) {
        return Some("invalid table number");
    }
    if extract_table_number(&session.id).is_some_and(|t| t != session.table_number) {
        return Some("id encodes a different table");
    }
    if session.status == SessionStatus::Active && session.expires_at < now {
        return Some("active past expiry");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str, table: &str, status: SessionStatus, expires_at: i64) -> Session {
        Session {
            id: id.to_string(),
            table_number: table.to_string(),
            desk_id: None,
            shop_id: 1,
            status,
            created_at: 0,
            last_activity: 0,
            expires_at,
            metadata: json!({}),
        }
    }

    #[test]
    fn test_problem_detection() {
        let ok = session("session-A1-1700000000000-abc123", "A1", SessionStatus::Active, 200);
        assert_eq!(problem_with(&ok, 100), None);

        let legacy = session("session-1700000000000-abc123", "B2", SessionStatus::Active, 200);
        assert_eq!(problem_with(&legacy, 100), None);

        let bad_id = session("sess-1", "A1", SessionStatus::Active, 200);
        assert_eq!(problem_with(&bad_id, 100), Some("malformed id"));

        let no_table = session("session-1700000000000-abc123", "", SessionStatus::Active, 200);
        assert_eq!(problem_with(&no_table, 100), Some("invalid table number"));

        let mismatch =
            session("session-A1-1700000000000-abc123", "B2", SessionStatus::Active, 200);
        assert_eq!(problem_with(&mismatch, 100), Some("id encodes a different table"));

        let stale = session("session-A1-1700000000000-abc123", "A1", SessionStatus::Active, 50);
        assert_eq!(problem_with(&stale, 100), Some("active past expiry"));

        let done =
            session("session-A1-1700000000000-abc123", "A1", SessionStatus::Completed, 50);
        assert_eq!(problem_with(&done, 100), None);
    }
}

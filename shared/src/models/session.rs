//! Ordering Session Model
//!
//! An anonymous customer visit to one table. The id is an opaque token of the
//! form `session-{table}-{ms timestamp}-{random}`; older clients may still
//! hold ids of the form `session-{ms timestamp}-{random}` (no table segment).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordering session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Expired,
    Completed,
}

impl SessionStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown session status '{other}'")),
        }
    }
}

/// Ordering session entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub table_number: String,
    /// Desk link, resolved lazily
    pub desk_id: Option<i64>,
    pub shop_id: i64,
    pub status: SessionStatus,
    pub created_at: i64,
    pub last_activity: i64,
    pub expires_at: i64,
    /// Free-form client metadata (JSON object)
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl Session {
    /// Active and not past its expiry at `now`
    pub fn is_live(&self, now: i64) -> bool {
        self.status == SessionStatus::Active && self.expires_at >= now
    }

    /// Synthetic session built while persistence was unreachable
    pub fn is_fallback(&self) -> bool {
        self.metadata
            .get("fallback")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// Create session payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreate {
    pub table_number: String,
    pub shop_id: i64,
    /// Lifetime in hours (1..=24, server default when absent)
    pub expiration_hours: Option<i64>,
    /// Always mint a new session instead of reusing the table's live one
    #[serde(default)]
    pub force_new: bool,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Result of a problematic-session sweep
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionCleanupReport {
    pub cleaned: u64,
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(status: SessionStatus, expires_at: i64) -> Session {
        Session {
            id: "session-A1-1700000000000-abc123".to_string(),
            table_number: "A1".to_string(),
            desk_id: None,
            shop_id: 1,
            status,
            created_at: 0,
            last_activity: 0,
            expires_at,
            metadata: serde_json::json!({}),
        }
    }

    #[test]
    fn test_is_live() {
        assert!(session(SessionStatus::Active, 100).is_live(100));
        assert!(!session(SessionStatus::Active, 99).is_live(100));
        assert!(!session(SessionStatus::Completed, 1000).is_live(100));
    }

    #[test]
    fn test_fallback_flag() {
        let mut s = session(SessionStatus::Active, 100);
        assert!(!s.is_fallback());
        s.metadata = serde_json::json!({ "fallback": true });
        assert!(s.is_fallback());
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            SessionStatus::Active,
            SessionStatus::Expired,
            SessionStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<SessionStatus>(), Ok(status));
        }
        assert!("closed".parse::<SessionStatus>().is_err());
    }
}

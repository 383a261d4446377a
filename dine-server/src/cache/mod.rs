//! Cache side channel
//!
//! Read-through acceleration only. Every cache failure degrades to a miss
//! (reads) or a no-op (writes); the store remains the source of truth.
//!
//! Keys:
//! - `session:{id}`
//! - `categories:{shop_id}`
//! - `menuItems:{shop_id}:{category_id|all}`
//! - `menuItem:{shop_id}:{id}`

pub mod memory;
pub mod redis;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use self::memory::MemoryCache;
pub use self::redis::RedisCache;

/// Cache error types (never surfaced past [`CacheLayer`])
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Cache command failed: {0}")]
    Command(String),
}

/// Minimal key/value cache interface
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError>;
    async fn del(&self, key: &str) -> Result<(), CacheError>;
}

/// Cache that stores nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

#[async_trait]
impl Cache for NoopCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn set_ex(&self, _key: &str, _value: &str, _ttl_secs: u64) -> Result<(), CacheError> {
        Ok(())
    }

    async fn del(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }
}

pub fn session_key(id: &str) -> String {
    format!("session:{id}")
}

pub fn categories_key(shop_id: i64) -> String {
    format!("categories:{shop_id}")
}

pub fn menu_items_key(shop_id: i64, category_id: Option<i64>) -> String {
    match category_id {
        Some(category_id) => format!("menuItems:{shop_id}:{category_id}"),
        None => format!("menuItems:{shop_id}:all"),
    }
}

pub fn menu_item_key(shop_id: i64, id: i64) -> String {
    format!("menuItem:{shop_id}:{id}")
}

/// Best-effort JSON wrapper around a [`Cache`]
#[derive(Clone)]
pub struct CacheLayer {
    inner: Arc<dyn Cache>,
}

impl CacheLayer {
    pub fn new(inner: Arc<dyn Cache>) -> Self {
        Self { inner }
    }

    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopCache))
    }

    /// Cached value, or `None` on miss, error or undecodable payload
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.inner.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::debug!(key, error = %e, "Discarding undecodable cache entry");
                    self.invalidate(key).await;
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::debug!(key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key, error = %e, "Cache value not serializable");
                return;
            }
        };
        if let Err(e) = self.inner.set_ex(key, &raw, ttl_secs).await {
            tracing::debug!(key, error = %e, "Cache write failed");
        }
    }

    pub async fn invalidate(&self, key: &str) {
        if let Err(e) = self.inner.del(key).await {
            tracing::debug!(key, error = %e, "Cache delete failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(session_key("session-A1-1"), "session:session-A1-1");
        assert_eq!(categories_key(7), "categories:7");
        assert_eq!(menu_items_key(7, Some(3)), "menuItems:7:3");
        assert_eq!(menu_items_key(7, None), "menuItems:7:all");
        assert_eq!(menu_item_key(7, 42), "menuItem:7:42");
    }

    #[tokio::test]
    async fn test_layer_swallows_errors() {
        let cache = MemoryCache::new();
        cache.set_unavailable(true);
        let layer = CacheLayer::new(Arc::new(cache.clone()));

        layer.set_json("k", &vec![1, 2, 3], 60).await;
        assert_eq!(layer.get_json::<Vec<i32>>("k").await, None);
        layer.invalidate("k").await;

        cache.set_unavailable(false);
        layer.set_json("k", &vec![1, 2, 3], 60).await;
        assert_eq!(layer.get_json::<Vec<i32>>("k").await, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_layer_drops_garbage() {
        let cache = MemoryCache::new();
        cache.set_ex("k", "not json", 60).await.unwrap();
        let layer = CacheLayer::new(Arc::new(cache.clone()));

        assert_eq!(layer.get_json::<Vec<i32>>("k").await, None);
        assert_eq!(cache.get("k").await.unwrap(), None);
    }
}

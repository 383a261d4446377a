//! Application state for dine-server

use std::sync::Arc;

use crate::cache::{CacheLayer, MemoryCache, RedisCache};
use crate::cart::CartService;
use crate::config::{CacheBackend, Config};
use crate::db::{self, DynStore};
use crate::desks::DeskService;
use crate::menu::MenuService;
use crate::message::EventBus;
use crate::orders::OrderService;
use crate::sessions::SessionManager;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: DynStore,
    pub cache: CacheLayer,
    /// Order/desk change notifications
    pub bus: EventBus,
    pub sessions: SessionManager,
    pub desks: DeskService,
    pub orders: OrderService,
    pub cart: CartService,
    pub menu: MenuService,
    /// JWT secret for staff authentication
    pub jwt_secret: String,
}

impl AppState {
    /// Connect the store and cache named by the configuration
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let store = db::connect(&config.database_url).await?;

        let cache = match (&config.redis_url, config.cache_backend) {
            (Some(url), _) => match RedisCache::connect(url).await {
                Ok(redis) => {
                    tracing::info!("Redis cache connected");
                    CacheLayer::new(Arc::new(redis))
                }
                Err(e) => {
                    // The cache is optional; run without it rather than refuse to start
                    tracing::warn!(error = %e, "Redis unreachable, caching disabled");
                    CacheLayer::disabled()
                }
            },
            (None, CacheBackend::Memory) => CacheLayer::new(Arc::new(MemoryCache::new())),
            (None, CacheBackend::None) => CacheLayer::disabled(),
        };

        Ok(Self::from_parts(store, cache, config))
    }

    /// Assemble the services over an existing store and cache
    pub fn from_parts(store: DynStore, cache: CacheLayer, config: &Config) -> Self {
        let bus = EventBus::new();
        let sessions = SessionManager::new(
            store.clone(),
            cache.clone(),
            config.session_expiration_hours,
            config.session_cache_ttl_secs,
        );
        let desks = DeskService::new(store.clone(), sessions.clone(), bus.clone());
        let orders = OrderService::new(store.clone(), sessions.clone(), bus.clone());
        let cart = CartService::new(store.clone(), orders.clone(), config.service_fee_percent);
        let menu = MenuService::new(store.clone(), cache.clone(), config.menu_cache_ttl_secs);

        Self {
            store,
            cache,
            bus,
            sessions,
            desks,
            orders,
            cart,
            menu,
            jwt_secret: config.jwt_secret.clone(),
        }
    }
}

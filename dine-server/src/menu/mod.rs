//! Menu reads
//!
//! Read-only, read-through cached. Menu maintenance happens elsewhere; keys
//! simply age out after the configured TTL.

use shared::error::{AppError, ErrorCode};
use shared::models::{Category, MenuItem};

use crate::cache::{CacheLayer, categories_key, menu_item_key, menu_items_key};
use crate::db::DynStore;
use crate::error::ServiceResult;

#[derive(Clone)]
pub struct MenuService {
    store: DynStore,
    cache: CacheLayer,
    ttl_secs: u64,
}

impl MenuService {
    pub fn new(store: DynStore, cache: CacheLayer, ttl_secs: u64) -> Self {
        Self {
            store,
            cache,
            ttl_secs,
        }
    }

    pub async fn list_categories(&self, shop_id: i64) -> ServiceResult<Vec<Category>> {
        let key = categories_key(shop_id);
        if let Some(hit) = self.cache.get_json(&key).await {
            return Ok(hit);
        }
        let categories = self.store.list_categories(shop_id).await?;
        self.cache.set_json(&key, &categories, self.ttl_secs).await;
        Ok(categories)
    }

    pub async fn list_items(
        &self,
        shop_id: i64,
        category_id: Option<i64>,
    ) -> ServiceResult<Vec<MenuItem>> {
        let key = menu_items_key(shop_id, category_id);
        if let Some(hit) = self.cache.get_json(&key).await {
            return Ok(hit);
        }
        let items = self.store.list_menu_items(shop_id, category_id).await?;
        self.cache.set_json(&key, &items, self.ttl_secs).await;
        Ok(items)
    }

    /// `MenuItemNotFound` when the item does not exist in this shop
    pub async fn get_item(&self, shop_id: i64, id: i64) -> ServiceResult<MenuItem> {
        let key = menu_item_key(shop_id, id);
        if let Some(hit) = self.cache.get_json::<MenuItem>(&key).await {
            return Ok(hit);
        }
        let item = self
            .store
            .get_menu_item(shop_id, id)
            .await?
            .ok_or_else(|| {
                AppError::new(ErrorCode::MenuItemNotFound).with_detail("menu_item_id", id)
            })?;
        self.cache.set_json(&key, &item, self.ttl_secs).await;
        Ok(item)
    }
}

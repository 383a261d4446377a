// dine-server/tests/common/mod.rs
// 测试公共设施: 内存存储 + 内存缓存 + 种子数据

#![allow(dead_code)]

use std::fmt::Debug;
use std::sync::Arc;

use dine_server::cache::{CacheLayer, MemoryCache};
use dine_server::db::{MemoryStore, Store};
use dine_server::{AppState, Config, ServiceResult};
use serde_json::json;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    CartItemAdd, Category, Customer, CustomizationOption, CustomizationSelection, MenuItem,
    Session, SessionCreate, Shop,
};

pub const SHOP: i64 = 1;
pub const OTHER_SHOP: i64 = 2;

pub const BURGER: i64 = 100;
pub const SALAD: i64 = 101;
pub const SOUP: i64 = 102;
pub const FOREIGN_ITEM: i64 = 200;
pub const CUSTOMER: i64 = 500;

pub struct TestApp {
    pub state: AppState,
    pub store: MemoryStore,
    pub cache: MemoryCache,
    pub config: Config,
}

pub async fn setup() -> TestApp {
    let config = Config::in_memory();
    let store = MemoryStore::new();
    let cache = MemoryCache::new();
    let state = AppState::from_parts(
        Arc::new(store.clone()),
        CacheLayer::new(Arc::new(cache.clone())),
        &config,
    );
    seed(&store).await;
    TestApp {
        state,
        store,
        cache,
        config,
    }
}

async fn seed(store: &MemoryStore) {
    for (id, slug) in [(SHOP, "noodle-bar"), (OTHER_SHOP, "taco-stand")] {
        store
            .insert_shop(&Shop {
                id,
                name: slug.replace('-', " "),
                slug: slug.to_string(),
                created_at: 0,
            })
            .await
            .unwrap();
    }

    store
        .insert_category(&Category {
            id: 10,
            shop_id: SHOP,
            name: "Mains".into(),
            sort_order: 1,
        })
        .await
        .unwrap();
    store
        .insert_category(&Category {
            id: 11,
            shop_id: SHOP,
            name: "Starters".into(),
            sort_order: 0,
        })
        .await
        .unwrap();

    let burger_options: Vec<CustomizationOption> = serde_json::from_value(json!([
        { "id": "size", "name": "Size", "type": "radio",
          "options": [
              { "id": "small", "name": "Small", "price": -2.0 },
              { "id": "large", "name": "Large", "price": 3.0 }
          ] },
        { "id": "cheese", "name": "Extra cheese", "type": "checkbox", "price": 1.5 }
    ]))
    .unwrap();

    let items = [
        menu_item(BURGER, SHOP, Some(10), "Burger", 12.5, true, burger_options),
        menu_item(SALAD, SHOP, Some(11), "Salad", 8.0, true, Vec::new()),
        menu_item(SOUP, SHOP, Some(11), "Soup", 6.0, false, Vec::new()),
        menu_item(FOREIGN_ITEM, OTHER_SHOP, None, "Taco", 4.0, true, Vec::new()),
    ];
    for item in &items {
        store.insert_menu_item(item).await.unwrap();
    }

    store
        .insert_customer(&Customer {
            id: CUSTOMER,
            shop_id: SHOP,
            name: "Ada".into(),
            email: Some("ada@example.com".into()),
            phone: None,
        })
        .await
        .unwrap();
}

fn menu_item(
    id: i64,
    shop_id: i64,
    category_id: Option<i64>,
    name: &str,
    price: f64,
    is_available: bool,
    customization_options: Vec<CustomizationOption>,
) -> MenuItem {
    MenuItem {
        id,
        shop_id,
        category_id,
        name: name.to_string(),
        description: None,
        price,
        is_available,
        customization_options,
    }
}

impl TestApp {
    /// Fresh session at a table of the main shop
    pub async fn session(&self, table: &str) -> Session {
        self.state
            .sessions
            .create(SessionCreate {
                table_number: table.to_string(),
                shop_id: SHOP,
                expiration_hours: None,
                force_new: true,
                metadata: None,
            })
            .await
            .unwrap()
    }

    pub async fn add(&self, session: &Session, menu_item_id: i64, quantity: i32) {
        self.add_custom(session, menu_item_id, quantity, json!({})).await;
    }

    pub async fn add_custom(
        &self,
        session: &Session,
        menu_item_id: i64,
        quantity: i32,
        customizations: serde_json::Value,
    ) {
        self.state
            .cart
            .add(session, cart_add(menu_item_id, quantity, customizations))
            .await
            .unwrap();
    }
}

pub fn cart_add(menu_item_id: i64, quantity: i32, customizations: serde_json::Value) -> CartItemAdd {
    CartItemAdd {
        menu_item_id,
        quantity,
        customizations: selection(customizations),
        special_instructions: None,
    }
}

pub fn selection(value: serde_json::Value) -> CustomizationSelection {
    serde_json::from_value(value).unwrap()
}

/// Error code of a failed service call
pub fn code_of<T: Debug>(result: ServiceResult<T>) -> ErrorCode {
    AppError::from(result.unwrap_err()).code
}

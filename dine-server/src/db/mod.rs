//! Persistence interface
//!
//! Every read of orders, menu items, desks and categories is scoped by
//! `shop_id`. Multi-statement mutations that must be atomic (order creation,
//! desk settlement) run through a [`StoreTx`]; dropping a transaction without
//! calling [`StoreTx::commit`] rolls it back.
//!
//! Two implementations:
//! - [`postgres::PgStore`]: sqlx + PostgreSQL
//! - [`memory::MemoryStore`]: in-process, used for `memory://` and tests

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use shared::models::{
    CartItem, Category, Customer, Desk, DeskStatus, MenuItem, Order, OrderItem, OrderStatus,
    Session, SessionStatus, Shop, order_occupies_desk,
};
use std::sync::Arc;
use thiserror::Error;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persistence error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// Backend unreachable (connection refused, pool exhausted, ...)
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    /// Stored data that does not decode into a valid model
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// Fault raised on purpose by the in-memory store
    #[error("Injected fault: {0}")]
    Injected(String),
}

impl StoreError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Result type for persistence operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Shared handle to a store implementation
pub type DynStore = Arc<dyn Store>;

/// Desk identity as seen by orders: linked by id, or historically by a
/// matching table number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeskRef {
    pub desk_id: i64,
    pub table_number: String,
}

impl DeskRef {
    pub fn of(desk: &Desk) -> Self {
        Self {
            desk_id: desk.id,
            table_number: desk.name.clone(),
        }
    }
}

/// Order list filter
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub shop_id: i64,
    pub status: Option<OrderStatus>,
    pub session_id: Option<String>,
    pub customer_id: Option<i64>,
    /// Exclude paid orders
    pub unpaid_only: bool,
    /// Only orders that occupy a desk (see [`order_occupies_desk`])
    pub occupying_only: bool,
    pub desk: Option<DeskRef>,
    pub exclude_id: Option<i64>,
}

impl OrderFilter {
    pub fn shop(shop_id: i64) -> Self {
        Self {
            shop_id,
            ..Default::default()
        }
    }

    /// Orders currently occupying the given desk
    pub fn occupying(shop_id: i64, desk: DeskRef) -> Self {
        Self {
            shop_id,
            occupying_only: true,
            desk: Some(desk),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: Option<OrderStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn excluding(mut self, order_id: i64) -> Self {
        self.exclude_id = Some(order_id);
        self
    }

    /// In-process evaluation; the postgres store compiles the same filter to SQL
    pub fn matches(&self, order: &Order) -> bool {
        order.shop_id == self.shop_id
            && self.status.is_none_or(|s| order.status == s)
            && self
                .session_id
                .as_deref()
                .is_none_or(|s| order.session_id.as_deref() == Some(s))
            && self.customer_id.is_none_or(|c| order.customer_id == Some(c))
            && (!self.unpaid_only || !order.paid)
            && (!self.occupying_only || order_occupies_desk(order.status, order.paid))
            && self
                .desk
                .as_ref()
                .is_none_or(|d| order.references_desk(d.desk_id, &d.table_number))
            && self.exclude_id != Some(order.id)
    }
}

/// Persistence interface
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a transaction
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>>;

    /// Connectivity check
    async fn ping(&self) -> StoreResult<()>;

    // ── Shops & customers ──

    async fn insert_shop(&self, shop: &Shop) -> StoreResult<()>;
    async fn get_shop(&self, id: i64) -> StoreResult<Option<Shop>>;
    async fn insert_customer(&self, customer: &Customer) -> StoreResult<()>;
    async fn get_customer(&self, shop_id: i64, id: i64) -> StoreResult<Option<Customer>>;

    // ── Menu ──

    async fn insert_category(&self, category: &Category) -> StoreResult<()>;
    async fn list_categories(&self, shop_id: i64) -> StoreResult<Vec<Category>>;
    /// Insert, or replace the item with the same id (schema is validated)
    async fn insert_menu_item(&self, item: &MenuItem) -> StoreResult<()>;
    async fn list_menu_items(
        &self,
        shop_id: i64,
        category_id: Option<i64>,
    ) -> StoreResult<Vec<MenuItem>>;
    async fn get_menu_item(&self, shop_id: i64, id: i64) -> StoreResult<Option<MenuItem>>;

    // ── Desks ──

    async fn list_desks(&self, shop_id: i64) -> StoreResult<Vec<Desk>>;
    async fn get_desk(&self, shop_id: i64, id: i64) -> StoreResult<Option<Desk>>;
    async fn find_desk_by_name(&self, shop_id: i64, name: &str) -> StoreResult<Option<Desk>>;
    /// Fails with `Duplicate` when the shop already has a desk with that name
    async fn insert_desk(&self, desk: &Desk) -> StoreResult<()>;
    /// Writes name, capacity and area
    async fn update_desk(&self, desk: &Desk) -> StoreResult<bool>;
    async fn set_desk_status(&self, shop_id: i64, id: i64, status: DeskStatus)
    -> StoreResult<bool>;
    async fn delete_desk(&self, shop_id: i64, id: i64) -> StoreResult<bool>;

    // ── Orders ──

    /// Newest first
    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>>;
    async fn count_orders(&self, filter: &OrderFilter) -> StoreResult<i64>;
    async fn get_order(&self, shop_id: i64, id: i64) -> StoreResult<Option<Order>>;
    async fn list_order_items(&self, order_ids: &[i64]) -> StoreResult<Vec<OrderItem>>;
    async fn update_order_status(
        &self,
        shop_id: i64,
        id: i64,
        status: OrderStatus,
        now: i64,
    ) -> StoreResult<Option<Order>>;

    // ── Cart ──

    /// Oldest first
    async fn list_cart_items(&self, session_id: &str) -> StoreResult<Vec<CartItem>>;
    async fn insert_cart_item(&self, item: &CartItem) -> StoreResult<()>;
    async fn update_cart_quantity(
        &self,
        session_id: &str,
        id: i64,
        quantity: i32,
    ) -> StoreResult<Option<CartItem>>;
    async fn delete_cart_item(&self, session_id: &str, id: i64) -> StoreResult<bool>;
    async fn clear_cart(&self, session_id: &str) -> StoreResult<u64>;

    // ── Sessions ──

    /// Fails with `Duplicate` when the id is taken
    async fn insert_session(&self, session: &Session) -> StoreResult<()>;
    /// Active and `expires_at >= now`
    async fn find_live_session(&self, id: &str, now: i64) -> StoreResult<Option<Session>>;
    /// Any status, expired or not
    async fn find_session(&self, id: &str) -> StoreResult<Option<Session>>;
    /// Most recently active live session for a table
    async fn latest_live_session(
        &self,
        shop_id: i64,
        table_number: &str,
        now: i64,
    ) -> StoreResult<Option<Session>>;
    /// Bump `last_activity` on an active session
    async fn touch_session(&self, id: &str, now: i64) -> StoreResult<bool>;
    async fn set_session_status(&self, id: &str, status: SessionStatus) -> StoreResult<bool>;
    /// Mark every active session of a table expired, returning their ids
    async fn expire_table_sessions(
        &self,
        shop_id: i64,
        table_number: &str,
    ) -> StoreResult<Vec<String>>;
    /// Delete sessions past expiry or marked expired, returning their ids
    async fn delete_expired_sessions(&self, now: i64) -> StoreResult<Vec<String>>;
    async fn list_sessions(&self) -> StoreResult<Vec<Session>>;
    async fn delete_session(&self, id: &str) -> StoreResult<bool>;
}

/// Statements that must commit or roll back together
#[async_trait]
pub trait StoreTx: Send {
    async fn insert_order(&mut self, order: &Order) -> StoreResult<()>;
    async fn set_order_desk(&mut self, order_id: i64, desk_id: i64) -> StoreResult<()>;
    async fn insert_order_items(&mut self, items: &[OrderItem]) -> StoreResult<()>;
    async fn get_desk(&mut self, shop_id: i64, id: i64) -> StoreResult<Option<Desk>>;
    async fn find_desk_by_name(&mut self, shop_id: i64, name: &str) -> StoreResult<Option<Desk>>;
    /// Insert unless the shop already has a desk with that name; returns
    /// the stored desk either way. Concurrent callers racing on the same
    /// name all get the one committed row.
    async fn insert_desk_if_absent(&mut self, desk: &Desk) -> StoreResult<Desk>;
    async fn set_desk_status(
        &mut self,
        shop_id: i64,
        id: i64,
        status: DeskStatus,
    ) -> StoreResult<bool>;
    async fn clear_cart(&mut self, session_id: &str) -> StoreResult<u64>;
    /// Flip every order occupying the desk to completed + paid, returning them
    async fn settle_desk_orders(
        &mut self,
        shop_id: i64,
        desk: &DeskRef,
        now: i64,
    ) -> StoreResult<Vec<Order>>;
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

/// Open a store from a connection URL (`postgres://…` or `memory://`)
pub async fn connect(url: &str) -> StoreResult<DynStore> {
    if url.starts_with("memory://") {
        tracing::warn!("Using in-memory store, data is lost on restart");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let store = PgStore::connect(url).await?;
    store.migrate().await?;
    Ok(Arc::new(store))
}

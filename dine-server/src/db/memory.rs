//! In-process store
//!
//! One lock guards the whole data set. A transaction holds the lock for its
//! lifetime and keeps a snapshot taken at `begin`; the snapshot is restored
//! when the transaction is dropped without commit.
//!
//! Callers must not use the non-transactional methods while they hold an
//! open transaction on the same store.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use shared::models::{
    CartItem, Category, Customer, Desk, DeskStatus, MenuItem, Order, OrderItem, OrderStatus,
    Session, SessionStatus, Shop,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{DeskRef, OrderFilter, Store, StoreError, StoreResult, StoreTx};

#[derive(Debug, Clone, Default)]
struct MemoryData {
    shops: BTreeMap<i64, Shop>,
    customers: BTreeMap<i64, Customer>,
    categories: BTreeMap<i64, Category>,
    menu_items: BTreeMap<i64, MenuItem>,
    desks: BTreeMap<i64, Desk>,
    orders: BTreeMap<i64, Order>,
    order_items: BTreeMap<i64, OrderItem>,
    cart_items: BTreeMap<i64, CartItem>,
    sessions: BTreeMap<String, Session>,
}

impl MemoryData {
    fn find_desk_by_name(&self, shop_id: i64, name: &str) -> Option<Desk> {
        self.desks
            .values()
            .find(|d| d.shop_id == shop_id && d.name == name)
            .cloned()
    }

    fn insert_desk(&mut self, desk: &Desk) -> StoreResult<()> {
        if self.desks.contains_key(&desk.id)
            || self.find_desk_by_name(desk.shop_id, &desk.name).is_some()
        {
            return Err(StoreError::Duplicate(format!("desk '{}'", desk.name)));
        }
        self.desks.insert(desk.id, desk.clone());
        Ok(())
    }

    fn set_desk_status(&mut self, shop_id: i64, id: i64, status: DeskStatus) -> bool {
        match self.desks.get_mut(&id) {
            Some(desk) if desk.shop_id == shop_id => {
                desk.status = status;
                true
            }
            _ => false,
        }
    }

    fn clear_cart(&mut self, session_id: &str) -> u64 {
        let before = self.cart_items.len();
        self.cart_items.retain(|_, item| item.session_id != session_id);
        (before - self.cart_items.len()) as u64
    }
}

/// Fault switches for exercising failure paths
#[derive(Debug, Default)]
struct Faults {
    unavailable: AtomicBool,
    fail_order_items: AtomicBool,
    fail_desk_status: AtomicBool,
}

/// In-memory [`Store`]
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<MemoryData>>,
    faults: Arc<Faults>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with [`StoreError::Unavailable`]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.faults.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make order-item inserts inside transactions fail
    pub fn set_fail_order_items(&self, fail: bool) {
        self.faults.fail_order_items.store(fail, Ordering::SeqCst);
    }

    /// Make desk status writes inside transactions fail
    pub fn set_fail_desk_status(&self, fail: bool) {
        self.faults.fail_desk_status.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> StoreResult<()> {
        if self.faults.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        self.check()?;
        let guard = self.data.clone().lock_owned().await;
        let snapshot = guard.clone();
        Ok(Box::new(MemoryTx {
            guard,
            snapshot: Some(snapshot),
            faults: self.faults.clone(),
        }))
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check()
    }

    async fn insert_shop(&self, shop: &Shop) -> StoreResult<()> {
        self.check()?;
        let mut data = self.data.lock().await;
        if data.shops.values().any(|s| s.id == shop.id || s.slug == shop.slug) {
            return Err(StoreError::Duplicate(format!("shop '{}'", shop.slug)));
        }
        data.shops.insert(shop.id, shop.clone());
        Ok(())
    }

    async fn get_shop(&self, id: i64) -> StoreResult<Option<Shop>> {
        self.check()?;
        Ok(self.data.lock().await.shops.get(&id).cloned())
    }

    async fn insert_customer(&self, customer: &Customer) -> StoreResult<()> {
        self.check()?;
        self.data
            .lock()
            .await
            .customers
            .insert(customer.id, customer.clone());
        Ok(())
    }

    async fn get_customer(&self, shop_id: i64, id: i64) -> StoreResult<Option<Customer>> {
        self.check()?;
        let data = self.data.lock().await;
        Ok(data
            .customers
            .get(&id)
            .filter(|c| c.shop_id == shop_id)
            .cloned())
    }

    async fn insert_category(&self, category: &Category) -> StoreResult<()> {
        self.check()?;
        self.data
            .lock()
            .await
            .categories
            .insert(category.id, category.clone());
        Ok(())
    }

    async fn list_categories(&self, shop_id: i64) -> StoreResult<Vec<Category>> {
        self.check()?;
        let data = self.data.lock().await;
        let mut categories: Vec<Category> = data
            .categories
            .values()
            .filter(|c| c.shop_id == shop_id)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.name.cmp(&b.name)));
        Ok(categories)
    }

    async fn insert_menu_item(&self, item: &MenuItem) -> StoreResult<()> {
        self.check()?;
        shared::models::validate_schema(&item.customization_options)
            .map_err(StoreError::Corrupt)?;
        self.data
            .lock()
            .await
            .menu_items
            .insert(item.id, item.clone());
        Ok(())
    }

    async fn list_menu_items(
        &self,
        shop_id: i64,
        category_id: Option<i64>,
    ) -> StoreResult<Vec<MenuItem>> {
        self.check()?;
        let data = self.data.lock().await;
        let mut items: Vec<MenuItem> = data
            .menu_items
            .values()
            .filter(|m| m.shop_id == shop_id)
            .filter(|m| category_id.is_none_or(|c| m.category_id == Some(c)))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn get_menu_item(&self, shop_id: i64, id: i64) -> StoreResult<Option<MenuItem>> {
        self.check()?;
        let data = self.data.lock().await;
        Ok(data
            .menu_items
            .get(&id)
            .filter(|m| m.shop_id == shop_id)
            .cloned())
    }

    async fn list_desks(&self, shop_id: i64) -> StoreResult<Vec<Desk>> {
        self.check()?;
        let data = self.data.lock().await;
        let mut desks: Vec<Desk> = data
            .desks
            .values()
            .filter(|d| d.shop_id == shop_id)
            .cloned()
            .collect();
        desks.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(desks)
    }

    async fn get_desk(&self, shop_id: i64, id: i64) -> StoreResult<Option<Desk>> {
        self.check()?;
        let data = self.data.lock().await;
        Ok(data.desks.get(&id).filter(|d| d.shop_id == shop_id).cloned())
    }

    async fn find_desk_by_name(&self, shop_id: i64, name: &str) -> StoreResult<Option<Desk>> {
        self.check()?;
        Ok(self.data.lock().await.find_desk_by_name(shop_id, name))
    }

    async fn insert_desk(&self, desk: &Desk) -> StoreResult<()> {
        self.check()?;
        self.data.lock().await.insert_desk(desk)
    }

    async fn update_desk(&self, desk: &Desk) -> StoreResult<bool> {
        self.check()?;
        let mut data = self.data.lock().await;
        if data
            .desks
            .values()
            .any(|d| d.shop_id == desk.shop_id && d.name == desk.name && d.id != desk.id)
        {
            return Err(StoreError::Duplicate(format!("desk '{}'", desk.name)));
        }
        match data.desks.get_mut(&desk.id) {
            Some(existing) if existing.shop_id == desk.shop_id => {
                existing.name = desk.name.clone();
                existing.capacity = desk.capacity;
                existing.area = desk.area.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_desk_status(
        &self,
        shop_id: i64,
        id: i64,
        status: DeskStatus,
    ) -> StoreResult<bool> {
        self.check()?;
        Ok(self.data.lock().await.set_desk_status(shop_id, id, status))
    }

    async fn delete_desk(&self, shop_id: i64, id: i64) -> StoreResult<bool> {
        self.check()?;
        let mut data = self.data.lock().await;
        if data.desks.get(&id).is_some_and(|d| d.shop_id == shop_id) {
            data.desks.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }

    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        self.check()?;
        let data = self.data.lock().await;
        let mut orders: Vec<Order> = data
            .orders
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn count_orders(&self, filter: &OrderFilter) -> StoreResult<i64> {
        self.check()?;
        let data = self.data.lock().await;
        Ok(data.orders.values().filter(|o| filter.matches(o)).count() as i64)
    }

    async fn get_order(&self, shop_id: i64, id: i64) -> StoreResult<Option<Order>> {
        self.check()?;
        let data = self.data.lock().await;
        Ok(data.orders.get(&id).filter(|o| o.shop_id == shop_id).cloned())
    }

    async fn list_order_items(&self, order_ids: &[i64]) -> StoreResult<Vec<OrderItem>> {
        self.check()?;
        let data = self.data.lock().await;
        Ok(data
            .order_items
            .values()
            .filter(|i| order_ids.contains(&i.order_id))
            .cloned()
            .collect())
    }

    async fn update_order_status(
        &self,
        shop_id: i64,
        id: i64,
        status: OrderStatus,
        now: i64,
    ) -> StoreResult<Option<Order>> {
        self.check()?;
        let mut data = self.data.lock().await;
        Ok(match data.orders.get_mut(&id) {
            Some(order) if order.shop_id == shop_id => {
                order.status = status;
                order.updated_at = now;
                Some(order.clone())
            }
            _ => None,
        })
    }

    async fn list_cart_items(&self, session_id: &str) -> StoreResult<Vec<CartItem>> {
        self.check()?;
        let data = self.data.lock().await;
        let mut items: Vec<CartItem> = data
            .cart_items
            .values()
            .filter(|i| i.session_id == session_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn insert_cart_item(&self, item: &CartItem) -> StoreResult<()> {
        self.check()?;
        let mut data = self.data.lock().await;
        if data.cart_items.contains_key(&item.id) {
            return Err(StoreError::Duplicate(format!("cart item {}", item.id)));
        }
        data.cart_items.insert(item.id, item.clone());
        Ok(())
    }

    async fn update_cart_quantity(
        &self,
        session_id: &str,
        id: i64,
        quantity: i32,
    ) -> StoreResult<Option<CartItem>> {
        self.check()?;
        let mut data = self.data.lock().await;
        Ok(match data.cart_items.get_mut(&id) {
            Some(item) if item.session_id == session_id => {
                item.quantity = quantity;
                Some(item.clone())
            }
            _ => None,
        })
    }

    async fn delete_cart_item(&self, session_id: &str, id: i64) -> StoreResult<bool> {
        self.check()?;
        let mut data = self.data.lock().await;
        if data
            .cart_items
            .get(&id)
            .is_some_and(|i| i.session_id == session_id)
        {
            data.cart_items.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }

    async fn clear_cart(&self, session_id: &str) -> StoreResult<u64> {
        self.check()?;
        Ok(self.data.lock().await.clear_cart(session_id))
    }

    async fn insert_session(&self, session: &Session) -> StoreResult<()> {
        self.check()?;
        let mut data = self.data.lock().await;
        if data.sessions.contains_key(&session.id) {
            return Err(StoreError::Duplicate(format!("session {}", session.id)));
        }
        data.sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn find_live_session(&self, id: &str, now: i64) -> StoreResult<Option<Session>> {
        self.check()?;
        let data = self.data.lock().await;
        Ok(data.sessions.get(id).filter(|s| s.is_live(now)).cloned())
    }

    async fn find_session(&self, id: &str) -> StoreResult<Option<Session>> {
        self.check()?;
        Ok(self.data.lock().await.sessions.get(id).cloned())
    }

    async fn latest_live_session(
        &self,
        shop_id: i64,
        table_number: &str,
        now: i64,
    ) -> StoreResult<Option<Session>> {
        self.check()?;
        let data = self.data.lock().await;
        Ok(data
            .sessions
            .values()
            .filter(|s| s.shop_id == shop_id && s.table_number == table_number && s.is_live(now))
            .max_by_key(|s| (s.last_activity, s.created_at))
            .cloned())
    }

    async fn touch_session(&self, id: &str, now: i64) -> StoreResult<bool> {
        self.check()?;
        let mut data = self.data.lock().await;
        Ok(match data.sessions.get_mut(id) {
            Some(session) if session.status == SessionStatus::Active => {
                session.last_activity = now;
                true
            }
            _ => false,
        })
    }

    async fn set_session_status(&self, id: &str, status: SessionStatus) -> StoreResult<bool> {
        self.check()?;
        let mut data = self.data.lock().await;
        Ok(match data.sessions.get_mut(id) {
            Some(session) => {
                session.status = status;
                true
            }
            None => false,
        })
    }

    async fn expire_table_sessions(
        &self,
        shop_id: i64,
        table_number: &str,
    ) -> StoreResult<Vec<String>> {
        self.check()?;
        let mut data = self.data.lock().await;
        let mut expired = Vec::new();
        for session in data.sessions.values_mut() {
            if session.shop_id == shop_id
                && session.table_number == table_number
                && session.status == SessionStatus::Active
            {
                session.status = SessionStatus::Expired;
                expired.push(session.id.clone());
            }
        }
        Ok(expired)
    }

    async fn delete_expired_sessions(&self, now: i64) -> StoreResult<Vec<String>> {
        self.check()?;
        let mut data = self.data.lock().await;
        let ids: Vec<String> = data
            .sessions
            .values()
            .filter(|s| s.expires_at < now || s.status == SessionStatus::Expired)
            .map(|s| s.id.clone())
            .collect();
        for id in &ids {
            data.sessions.remove(id);
        }
        Ok(ids)
    }

    async fn list_sessions(&self) -> StoreResult<Vec<Session>> {
        self.check()?;
        Ok(self.data.lock().await.sessions.values().cloned().collect())
    }

    async fn delete_session(&self, id: &str) -> StoreResult<bool> {
        self.check()?;
        Ok(self.data.lock().await.sessions.remove(id).is_some())
    }
}

/// Transaction over [`MemoryStore`]
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryData>,
    snapshot: Option<MemoryData>,
    faults: Arc<Faults>,
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.guard = snapshot;
            tracing::debug!("memory transaction rolled back");
        }
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
        if self.guard.orders.contains_key(&order.id) {
            return Err(StoreError::Duplicate(format!("order {}", order.id)));
        }
        self.guard.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn set_order_desk(&mut self, order_id: i64, desk_id: i64) -> StoreResult<()> {
        let order = self
            .guard
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| StoreError::NotFound(format!("order {order_id}")))?;
        order.desk_id = Some(desk_id);
        Ok(())
    }

    async fn insert_order_items(&mut self, items: &[OrderItem]) -> StoreResult<()> {
        if self.faults.fail_order_items.load(Ordering::SeqCst) {
            return Err(StoreError::Injected("order item insert".into()));
        }
        for item in items {
            if !self.guard.orders.contains_key(&item.order_id) {
                return Err(StoreError::Database(format!(
                    "order item {} references missing order {}",
                    item.id, item.order_id
                )));
            }
            self.guard.order_items.insert(item.id, item.clone());
        }
        Ok(())
    }

    async fn get_desk(&mut self, shop_id: i64, id: i64) -> StoreResult<Option<Desk>> {
        Ok(self
            .guard
            .desks
            .get(&id)
            .filter(|d| d.shop_id == shop_id)
            .cloned())
    }

    async fn find_desk_by_name(&mut self, shop_id: i64, name: &str) -> StoreResult<Option<Desk>> {
        Ok(self.guard.find_desk_by_name(shop_id, name))
    }

    async fn insert_desk_if_absent(&mut self, desk: &Desk) -> StoreResult<Desk> {
        if let Some(existing) = self.guard.find_desk_by_name(desk.shop_id, &desk.name) {
            return Ok(existing);
        }
        self.guard.insert_desk(desk)?;
        Ok(desk.clone())
    }

    async fn set_desk_status(
        &mut self,
        shop_id: i64,
        id: i64,
        status: DeskStatus,
    ) -> StoreResult<bool> {
        if self.faults.fail_desk_status.load(Ordering::SeqCst) {
            return Err(StoreError::Injected("desk status update".into()));
        }
        Ok(self.guard.set_desk_status(shop_id, id, status))
    }

    async fn clear_cart(&mut self, session_id: &str) -> StoreResult<u64> {
        Ok(self.guard.clear_cart(session_id))
    }

    async fn settle_desk_orders(
        &mut self,
        shop_id: i64,
        desk: &DeskRef,
        now: i64,
    ) -> StoreResult<Vec<Order>> {
        let filter = OrderFilter::occupying(shop_id, desk.clone());
        let mut settled = Vec::new();
        for order in self.guard.orders.values_mut() {
            if filter.matches(order) {
                order.status = OrderStatus::Completed;
                order.paid = true;
                order.updated_at = now;
                settled.push(order.clone());
            }
        }
        settled.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(settled)
    }

    async fn commit(mut self: Box<Self>) -> StoreResult<()> {
        self.snapshot = None;
        Ok(())
    }
}

//! Order Lifecycle
//!
//! Order creation is one transaction: order row, desk resolution (with lazy
//! desk provisioning), items, cart consumption. Completing the originating
//! session happens after commit and is allowed to fail.
//!
//! Status changes move forward along the kitchen path or jump to cancelled.
//! Reaching a terminal status frees the desk when no other order occupies it.

use std::collections::HashMap;

use shared::error::{AppError, ErrorCode};
use shared::message::DineEvent;
use shared::models::{
    Customer, Desk, DeskStatus, InvalidOrderStatus, Order, OrderCreate, OrderDetail, OrderItem,
    OrderItemCreate, OrderStatus,
};
use shared::util::{now_millis, snowflake_id};

use crate::db::{DeskRef, DynStore, OrderFilter};
use crate::desks::resolve_or_create;
use crate::error::ServiceResult;
use crate::message::EventBus;
use crate::sessions::{SessionManager, is_valid_table_number};

#[derive(Clone)]
pub struct OrderService {
    store: DynStore,
    sessions: SessionManager,
    bus: EventBus,
}

impl OrderService {
    pub fn new(store: DynStore, sessions: SessionManager, bus: EventBus) -> Self {
        Self {
            store,
            sessions,
            bus,
        }
    }

    /// Place an order. Prices in `data` and `items` are taken as given.
    pub async fn create(
        &self,
        data: OrderCreate,
        items: Vec<OrderItemCreate>,
    ) -> ServiceResult<OrderDetail> {
        if items.is_empty() {
            return Err(AppError::new(ErrorCode::OrderEmpty).into());
        }
        if let Some(bad) = items.iter().find(|i| i.quantity < 1) {
            return Err(AppError::new(ErrorCode::InvalidQuantity)
                .with_detail("menu_item_id", bad.menu_item_id)
                .with_detail("quantity", bad.quantity)
                .into());
        }
        let table_number = data
            .table_number
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        if let Some(table) = table_number.as_deref()
            && !is_valid_table_number(table)
        {
            return Err(AppError::with_message(
                ErrorCode::InvalidTableNumber,
                format!("invalid table number '{table}'"),
            )
            .into());
        }

        let now = now_millis();
        let mut order = Order {
            id: snowflake_id(),
            shop_id: data.shop_id,
            customer_id: data.customer_id,
            desk_id: None,
            session_id: data.session_id,
            table_number,
            status: OrderStatus::Pending,
            subtotal: data.subtotal,
            service_fee: data.service_fee,
            total: data.total,
            paid: false,
            customer_name: data.customer_name,
            customer_phone: data.customer_phone,
            notes: data.notes,
            created_at: now,
            updated_at: now,
        };
        let items: Vec<OrderItem> = items
            .into_iter()
            .map(|item| OrderItem {
                id: snowflake_id(),
                order_id: order.id,
                menu_item_id: item.menu_item_id,
                name: item.name,
                price: item.price,
                quantity: item.quantity,
                customizations: item.customizations,
                special_instructions: item.special_instructions,
                customization_cost: item.customization_cost,
            })
            .collect();

        let mut tx = self.store.begin().await?;
        tx.insert_order(&order).await?;

        let mut desk: Option<(Desk, DeskStatus)> = None;
        if let Some(table) = order.table_number.as_deref() {
            let mut resolved = resolve_or_create(tx.as_mut(), order.shop_id, table).await?;
            let previous = resolved.status;
            tx.set_desk_status(order.shop_id, resolved.id, DeskStatus::Occupied)
                .await?;
            tx.set_order_desk(order.id, resolved.id).await?;
            order.desk_id = Some(resolved.id);
            resolved.status = DeskStatus::Occupied;
            desk = Some((resolved, previous));
        }

        tx.insert_order_items(&items).await?;
        if let Some(session_id) = order.session_id.as_deref() {
            let cleared = tx.clear_cart(session_id).await?;
            tracing::debug!(session_id, cleared, "Cart consumed by order");
        }
        tx.commit().await?;

        tracing::info!(
            order_id = order.id,
            shop_id = order.shop_id,
            desk_id = ?order.desk_id,
            items = items.len(),
            total = order.total,
            "Order created"
        );

        if let Some(session_id) = order.session_id.as_deref() {
            match self.sessions.complete(session_id).await {
                Ok(true) => {}
                Ok(false) => tracing::warn!(session_id, "Ordering session was not active"),
                Err(e) => {
                    let e: AppError = e.into();
                    tracing::warn!(session_id, error = %e, "Failed to complete ordering session");
                }
            }
        }

        self.bus.publish(DineEvent::order_created(&order));
        if let Some((desk, previous)) = &desk
            && *previous != DeskStatus::Occupied
        {
            self.bus.publish(DineEvent::desk_status_changed(
                desk.shop_id,
                desk.id,
                DeskStatus::Occupied,
            ));
        }

        let customer = match order.customer_id {
            Some(customer_id) => self
                .store
                .get_customer(order.shop_id, customer_id)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(customer_id, error = %e, "Customer lookup failed");
                    None
                }),
            None => None,
        };

        Ok(OrderDetail {
            order,
            items,
            customer,
            desk: desk.map(|(d, _)| d),
        })
    }

    /// Move an order to `status`, freeing its desk when it was the last
    /// occupying order
    pub async fn update_status(
        &self,
        shop_id: i64,
        id: i64,
        status: &str,
    ) -> ServiceResult<Order> {
        let next = parse_status(status)?;
        let current = self
            .store
            .get_order(shop_id, id)
            .await?
            .ok_or_else(|| order_not_found(id))?;

        if current.status == next {
            return Ok(current);
        }
        if current.status.is_terminal() {
            return Err(AppError::new(ErrorCode::OrderAlreadyCompleted)
                .with_detail("order_id", id)
                .with_detail("status", current.status.as_str())
                .into());
        }
        if !current.status.can_transition_to(next) {
            return Err(AppError::with_message(
                ErrorCode::OrderInvalidStatus,
                format!("cannot move order from {} to {next}", current.status),
            )
            .into());
        }

        let order = self
            .store
            .update_order_status(shop_id, id, next, now_millis())
            .await?
            .ok_or_else(|| order_not_found(id))?;
        tracing::info!(
            order_id = id,
            shop_id,
            from = %current.status,
            to = %next,
            "Order status changed"
        );

        if next.is_terminal()
            && let Some(desk_id) = order.desk_id
        {
            self.release_if_idle(&order, desk_id).await?;
        }

        self.bus
            .publish(DineEvent::order_status_changed(&order, current.status));
        Ok(order)
    }

    async fn release_if_idle(&self, order: &Order, desk_id: i64) -> ServiceResult<()> {
        let Some(desk) = self.store.get_desk(order.shop_id, desk_id).await? else {
            tracing::warn!(order_id = order.id, desk_id, "Order references a missing desk");
            return Ok(());
        };
        let filter = OrderFilter::occupying(order.shop_id, DeskRef::of(&desk)).excluding(order.id);
        let others = self.store.count_orders(&filter).await?;
        if others == 0 && desk.status != DeskStatus::Available {
            self.store
                .set_desk_status(order.shop_id, desk_id, DeskStatus::Available)
                .await?;
            tracing::info!(desk_id, shop_id = order.shop_id, "Desk freed by last order");
            self.bus.publish(DineEvent::desk_status_changed(
                order.shop_id,
                desk_id,
                DeskStatus::Available,
            ));
        }
        Ok(())
    }

    /// Newest first, optionally filtered by status
    pub async fn list(
        &self,
        shop_id: i64,
        status: Option<&str>,
    ) -> ServiceResult<Vec<OrderDetail>> {
        let status = status.map(parse_status).transpose()?;
        let orders = self
            .store
            .list_orders(&OrderFilter::shop(shop_id).with_status(status))
            .await?;
        self.populate(orders).await
    }

    pub async fn get(&self, shop_id: i64, id: i64) -> ServiceResult<OrderDetail> {
        let order = self
            .store
            .get_order(shop_id, id)
            .await?
            .ok_or_else(|| order_not_found(id))?;
        let mut details = self.populate(vec![order]).await?;
        details.pop().ok_or_else(|| order_not_found(id).into())
    }

    /// Unpaid orders placed from a session
    pub async fn list_for_session(
        &self,
        shop_id: i64,
        session_id: &str,
    ) -> ServiceResult<Vec<OrderDetail>> {
        let orders = self
            .store
            .list_orders(&OrderFilter {
                shop_id,
                session_id: Some(session_id.to_string()),
                unpaid_only: true,
                ..Default::default()
            })
            .await?;
        self.populate(orders).await
    }

    pub async fn list_for_customer(
        &self,
        shop_id: i64,
        customer_id: i64,
    ) -> ServiceResult<Vec<OrderDetail>> {
        let orders = self
            .store
            .list_orders(&OrderFilter {
                shop_id,
                customer_id: Some(customer_id),
                ..Default::default()
            })
            .await?;
        self.populate(orders).await
    }

    /// Attach items, customer and desk to each order
    async fn populate(&self, orders: Vec<Order>) -> ServiceResult<Vec<OrderDetail>> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        let mut items_by_order: HashMap<i64, Vec<OrderItem>> = HashMap::new();
        for item in self.store.list_order_items(&ids).await? {
            items_by_order.entry(item.order_id).or_default().push(item);
        }

        let mut customers: HashMap<i64, Option<Customer>> = HashMap::new();
        let mut desks: HashMap<i64, Option<Desk>> = HashMap::new();
        let mut details = Vec::with_capacity(orders.len());
        for order in orders {
            let customer = match order.customer_id {
                Some(cid) => {
                    if !customers.contains_key(&cid) {
                        let found = self.store.get_customer(order.shop_id, cid).await?;
                        customers.insert(cid, found);
                    }
                    customers.get(&cid).cloned().flatten()
                }
                None => None,
            };
            let desk = match order.desk_id {
                Some(did) => {
                    if !desks.contains_key(&did) {
                        let found = self.store.get_desk(order.shop_id, did).await?;
                        desks.insert(did, found);
                    }
                    desks.get(&did).cloned().flatten()
                }
                None => None,
            };
            details.push(OrderDetail {
                items: items_by_order.remove(&order.id).unwrap_or_default(),
                order,
                customer,
                desk,
            });
        }
        Ok(details)
    }
}

fn parse_status(status: &str) -> Result<OrderStatus, AppError> {
    status.parse().map_err(|e: InvalidOrderStatus| {
        AppError::with_message(ErrorCode::OrderInvalidStatus, e.to_string())
            .with_detail("status", status)
    })
}

fn order_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::OrderNotFound).with_detail("order_id", id)
}

//! PostgreSQL store (sqlx)

mod rows;

use std::time::Duration;

use async_trait::async_trait;
use shared::models::{
    CartItem, Category, Customer, Desk, DeskStatus, MenuItem, Order, OrderItem, OrderStatus,
    Session, SessionStatus, Shop,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Postgres, Transaction};

use self::rows::{
    CartItemRow, CategoryRow, CustomerRow, DeskRow, MenuItemRow, OrderItemRow, OrderRow,
    SessionRow, ShopRow, orders_from_rows,
};
use super::{DeskRef, OrderFilter, Store, StoreError, StoreResult, StoreTx};

/// SQL form of `order_occupies_desk`: the order is neither cancelled nor paid
macro_rules! occupying {
    () => {
        "status <> 'cancelled' AND paid = FALSE"
    };
}

macro_rules! order_columns {
    () => {
        "id, shop_id, customer_id, desk_id, session_id, table_number, status, \
         subtotal, service_fee, total, paid, customer_name, customer_phone, notes, \
         created_at, updated_at"
    };
}

macro_rules! desk_columns {
    () => {
        "id, shop_id, name, capacity, status, area, created_at"
    };
}

macro_rules! session_columns {
    () => {
        "id, table_number, desk_id, shop_id, status, created_at, last_activity, expires_at, metadata"
    };
}

macro_rules! menu_item_columns {
    () => {
        "id, shop_id, category_id, name, description, price, is_available, customization_options"
    };
}

macro_rules! cart_columns {
    () => {
        "id, session_id, shop_id, menu_item_id, quantity, customizations, special_instructions, created_at"
    };
}

/// `WHERE` clause shared by order listing and counting.
/// Binds: $1 shop, $2 status, $3 session, $4 customer, $5 unpaid_only,
/// $6 occupying_only, $7 desk id, $8 desk table number, $9 excluded id.
macro_rules! order_filter {
    () => {
        concat!(
            " WHERE shop_id = $1",
            " AND ($2::TEXT IS NULL OR status = $2)",
            " AND ($3::TEXT IS NULL OR session_id = $3)",
            " AND ($4::BIGINT IS NULL OR customer_id = $4)",
            " AND (NOT $5 OR paid = FALSE)",
            " AND (NOT $6 OR (",
            occupying!(),
            "))",
            " AND ($7::BIGINT IS NULL OR desk_id = $7 OR table_number = $8)",
            " AND ($9::BIGINT IS NULL OR id <> $9)"
        )
    };
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound(err.to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Duplicate(db.message().to_string())
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
            sqlx::Error::Decode(_) | sqlx::Error::ColumnDecode { .. } => {
                StoreError::Corrupt(err.to_string())
            }
            _ => StoreError::Database(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Database(format!("migration failed: {err}"))
    }
}

/// PostgreSQL-backed [`Store`]
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // ── Shops & customers ──

    async fn insert_shop(&self, shop: &Shop) -> StoreResult<()> {
        sqlx::query("INSERT INTO shops (id, name, slug, created_at) VALUES ($1, $2, $3, $4)")
            .bind(shop.id)
            .bind(&shop.name)
            .bind(&shop.slug)
            .bind(shop.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_shop(&self, id: i64) -> StoreResult<Option<Shop>> {
        let row: Option<ShopRow> =
            sqlx::query_as("SELECT id, name, slug, created_at FROM shops WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Shop::from))
    }

    async fn insert_customer(&self, customer: &Customer) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO customers (id, shop_id, name, email, phone) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(customer.id)
        .bind(customer.shop_id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_customer(&self, shop_id: i64, id: i64) -> StoreResult<Option<Customer>> {
        let row: Option<CustomerRow> = sqlx::query_as(
            "SELECT id, shop_id, name, email, phone FROM customers WHERE shop_id = $1 AND id = $2",
        )
        .bind(shop_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Customer::from))
    }

    // ── Menu ──

    async fn insert_category(&self, category: &Category) -> StoreResult<()> {
        sqlx::query("INSERT INTO categories (id, shop_id, name, sort_order) VALUES ($1, $2, $3, $4)")
            .bind(category.id)
            .bind(category.shop_id)
            .bind(&category.name)
            .bind(category.sort_order)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_categories(&self, shop_id: i64) -> StoreResult<Vec<Category>> {
        let rows: Vec<CategoryRow> = sqlx::query_as(
            "SELECT id, shop_id, name, sort_order FROM categories WHERE shop_id = $1 ORDER BY sort_order, name",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn insert_menu_item(&self, item: &MenuItem) -> StoreResult<()> {
        shared::models::validate_schema(&item.customization_options)
            .map_err(StoreError::Corrupt)?;
        sqlx::query(concat!(
            "INSERT INTO menu_items (",
            menu_item_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8) ",
            "ON CONFLICT (id) DO UPDATE SET category_id = EXCLUDED.category_id, ",
            "name = EXCLUDED.name, description = EXCLUDED.description, ",
            "price = EXCLUDED.price, is_available = EXCLUDED.is_available, ",
            "customization_options = EXCLUDED.customization_options ",
            "WHERE menu_items.shop_id = EXCLUDED.shop_id"
        ))
        .bind(item.id)
        .bind(item.shop_id)
        .bind(item.category_id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price)
        .bind(item.is_available)
        .bind(Json(&item.customization_options))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_menu_items(
        &self,
        shop_id: i64,
        category_id: Option<i64>,
    ) -> StoreResult<Vec<MenuItem>> {
        let rows: Vec<MenuItemRow> = sqlx::query_as(concat!(
            "SELECT ",
            menu_item_columns!(),
            " FROM menu_items WHERE shop_id = $1 AND ($2::BIGINT IS NULL OR category_id = $2)",
            " ORDER BY name"
        ))
        .bind(shop_id)
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(MenuItem::try_from).collect()
    }

    async fn get_menu_item(&self, shop_id: i64, id: i64) -> StoreResult<Option<MenuItem>> {
        let row: Option<MenuItemRow> = sqlx::query_as(concat!(
            "SELECT ",
            menu_item_columns!(),
            " FROM menu_items WHERE shop_id = $1 AND id = $2"
        ))
        .bind(shop_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(MenuItem::try_from).transpose()
    }

    // ── Desks ──

    async fn list_desks(&self, shop_id: i64) -> StoreResult<Vec<Desk>> {
        let rows: Vec<DeskRow> = sqlx::query_as(concat!(
            "SELECT ",
            desk_columns!(),
            " FROM desks WHERE shop_id = $1 ORDER BY name"
        ))
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Desk::try_from).collect()
    }

    async fn get_desk(&self, shop_id: i64, id: i64) -> StoreResult<Option<Desk>> {
        let row: Option<DeskRow> = sqlx::query_as(concat!(
            "SELECT ",
            desk_columns!(),
            " FROM desks WHERE shop_id = $1 AND id = $2"
        ))
        .bind(shop_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Desk::try_from).transpose()
    }

    async fn find_desk_by_name(&self, shop_id: i64, name: &str) -> StoreResult<Option<Desk>> {
        let row: Option<DeskRow> = sqlx::query_as(concat!(
            "SELECT ",
            desk_columns!(),
            " FROM desks WHERE shop_id = $1 AND name = $2"
        ))
        .bind(shop_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Desk::try_from).transpose()
    }

    async fn insert_desk(&self, desk: &Desk) -> StoreResult<()> {
        insert_desk(&self.pool, desk).await
    }

    async fn update_desk(&self, desk: &Desk) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE desks SET name = $1, capacity = $2, area = $3 WHERE shop_id = $4 AND id = $5",
        )
        .bind(&desk.name)
        .bind(desk.capacity)
        .bind(&desk.area)
        .bind(desk.shop_id)
        .bind(desk.id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_desk_status(
        &self,
        shop_id: i64,
        id: i64,
        status: DeskStatus,
    ) -> StoreResult<bool> {
        set_desk_status(&self.pool, shop_id, id, status).await
    }

    async fn delete_desk(&self, shop_id: i64, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM desks WHERE shop_id = $1 AND id = $2")
            .bind(shop_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Orders ──

    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        let desk = filter.desk.as_ref();
        let rows: Vec<OrderRow> = sqlx::query_as(concat!(
            "SELECT ",
            order_columns!(),
            " FROM orders",
            order_filter!(),
            " ORDER BY created_at DESC, id DESC"
        ))
        .bind(filter.shop_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.session_id.as_deref())
        .bind(filter.customer_id)
        .bind(filter.unpaid_only)
        .bind(filter.occupying_only)
        .bind(desk.map(|d| d.desk_id))
        .bind(desk.map(|d| d.table_number.as_str()))
        .bind(filter.exclude_id)
        .fetch_all(&self.pool)
        .await?;
        orders_from_rows(rows)
    }

    async fn count_orders(&self, filter: &OrderFilter) -> StoreResult<i64> {
        let desk = filter.desk.as_ref();
        let (count,): (i64,) = sqlx::query_as(concat!(
            "SELECT COUNT(*) FROM orders",
            order_filter!()
        ))
        .bind(filter.shop_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.session_id.as_deref())
        .bind(filter.customer_id)
        .bind(filter.unpaid_only)
        .bind(filter.occupying_only)
        .bind(desk.map(|d| d.desk_id))
        .bind(desk.map(|d| d.table_number.as_str()))
        .bind(filter.exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn get_order(&self, shop_id: i64, id: i64) -> StoreResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(concat!(
            "SELECT ",
            order_columns!(),
            " FROM orders WHERE shop_id = $1 AND id = $2"
        ))
        .bind(shop_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Order::try_from).transpose()
    }

    async fn list_order_items(&self, order_ids: &[i64]) -> StoreResult<Vec<OrderItem>> {
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<OrderItemRow> = sqlx::query_as(
            r#"
            SELECT id, order_id, menu_item_id, name, price, quantity, customizations,
                   special_instructions, customization_cost
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, id
            "#,
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    async fn update_order_status(
        &self,
        shop_id: i64,
        id: i64,
        status: OrderStatus,
        now: i64,
    ) -> StoreResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(concat!(
            "UPDATE orders SET status = $1, updated_at = $2 WHERE shop_id = $3 AND id = $4 RETURNING ",
            order_columns!()
        ))
        .bind(status.as_str())
        .bind(now)
        .bind(shop_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Order::try_from).transpose()
    }

    // ── Cart ──

    async fn list_cart_items(&self, session_id: &str) -> StoreResult<Vec<CartItem>> {
        let rows: Vec<CartItemRow> = sqlx::query_as(concat!(
            "SELECT ",
            cart_columns!(),
            " FROM cart_items WHERE session_id = $1 ORDER BY created_at, id"
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(CartItem::from).collect())
    }

    async fn insert_cart_item(&self, item: &CartItem) -> StoreResult<()> {
        sqlx::query(concat!(
            "INSERT INTO cart_items (",
            cart_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(item.id)
        .bind(&item.session_id)
        .bind(item.shop_id)
        .bind(item.menu_item_id)
        .bind(item.quantity)
        .bind(Json(&item.customizations))
        .bind(&item.special_instructions)
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_cart_quantity(
        &self,
        session_id: &str,
        id: i64,
        quantity: i32,
    ) -> StoreResult<Option<CartItem>> {
        let row: Option<CartItemRow> = sqlx::query_as(concat!(
            "UPDATE cart_items SET quantity = $1 WHERE session_id = $2 AND id = $3 RETURNING ",
            cart_columns!()
        ))
        .bind(quantity)
        .bind(session_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(CartItem::from))
    }

    async fn delete_cart_item(&self, session_id: &str, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM cart_items WHERE session_id = $1 AND id = $2")
            .bind(session_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_cart(&self, session_id: &str) -> StoreResult<u64> {
        clear_cart(&self.pool, session_id).await
    }

    // ── Sessions ──

    async fn insert_session(&self, session: &Session) -> StoreResult<()> {
        sqlx::query(concat!(
            "INSERT INTO sessions (",
            session_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(&session.id)
        .bind(&session.table_number)
        .bind(session.desk_id)
        .bind(session.shop_id)
        .bind(session.status.as_str())
        .bind(session.created_at)
        .bind(session.last_activity)
        .bind(session.expires_at)
        .bind(Json(&session.metadata))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_live_session(&self, id: &str, now: i64) -> StoreResult<Option<Session>> {
        let row: Option<SessionRow> = sqlx::query_as(concat!(
            "SELECT ",
            session_columns!(),
            " FROM sessions WHERE id = $1 AND status = 'active' AND expires_at >= $2"
        ))
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Session::try_from).transpose()
    }

    async fn find_session(&self, id: &str) -> StoreResult<Option<Session>> {
        let row: Option<SessionRow> = sqlx::query_as(concat!(
            "SELECT ",
            session_columns!(),
            " FROM sessions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Session::try_from).transpose()
    }

    async fn latest_live_session(
        &self,
        shop_id: i64,
        table_number: &str,
        now: i64,
    ) -> StoreResult<Option<Session>> {
        let row: Option<SessionRow> = sqlx::query_as(concat!(
            "SELECT ",
            session_columns!(),
            " FROM sessions",
            " WHERE shop_id = $1 AND table_number = $2 AND status = 'active' AND expires_at >= $3",
            " ORDER BY last_activity DESC, created_at DESC LIMIT 1"
        ))
        .bind(shop_id)
        .bind(table_number)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Session::try_from).transpose()
    }

    async fn touch_session(&self, id: &str, now: i64) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE sessions SET last_activity = $1 WHERE id = $2 AND status = 'active'",
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_session_status(&self, id: &str, status: SessionStatus) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE sessions SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn expire_table_sessions(
        &self,
        shop_id: i64,
        table_number: &str,
    ) -> StoreResult<Vec<String>> {
        let ids: Vec<(String,)> = sqlx::query_as(
            r#"
            UPDATE sessions SET status = 'expired'
            WHERE shop_id = $1 AND table_number = $2 AND status = 'active'
            RETURNING id
            "#,
        )
        .bind(shop_id)
        .bind(table_number)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    async fn delete_expired_sessions(&self, now: i64) -> StoreResult<Vec<String>> {
        let ids: Vec<(String,)> = sqlx::query_as(
            "DELETE FROM sessions WHERE expires_at < $1 OR status = 'expired' RETURNING id",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    async fn list_sessions(&self) -> StoreResult<Vec<Session>> {
        let rows: Vec<SessionRow> = sqlx::query_as(concat!(
            "SELECT ",
            session_columns!(),
            " FROM sessions ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Session::try_from).collect()
    }

    async fn delete_session(&self, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ── Statements shared by pool and transaction ──

async fn insert_desk<'e, E>(executor: E, desk: &Desk) -> StoreResult<()>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query(concat!(
        "INSERT INTO desks (",
        desk_columns!(),
        ") VALUES ($1, $2, $3, $4, $5, $6, $7)"
    ))
    .bind(desk.id)
    .bind(desk.shop_id)
    .bind(&desk.name)
    .bind(desk.capacity)
    .bind(desk.status.as_str())
    .bind(&desk.area)
    .bind(desk.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

async fn set_desk_status<'e, E>(
    executor: E,
    shop_id: i64,
    id: i64,
    status: DeskStatus,
) -> StoreResult<bool>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("UPDATE desks SET status = $1 WHERE shop_id = $2 AND id = $3")
        .bind(status.as_str())
        .bind(shop_id)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn clear_cart<'e, E>(executor: E, session_id: &str) -> StoreResult<u64>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM cart_items WHERE session_id = $1")
        .bind(session_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Transaction over [`PgStore`]; sqlx rolls back on drop
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
        sqlx::query(concat!(
            "INSERT INTO orders (",
            order_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)"
        ))
        .bind(order.id)
        .bind(order.shop_id)
        .bind(order.customer_id)
        .bind(order.desk_id)
        .bind(&order.session_id)
        .bind(&order.table_number)
        .bind(order.status.as_str())
        .bind(order.subtotal)
        .bind(order.service_fee)
        .bind(order.total)
        .bind(order.paid)
        .bind(&order.customer_name)
        .bind(&order.customer_phone)
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn set_order_desk(&mut self, order_id: i64, desk_id: i64) -> StoreResult<()> {
        let result = sqlx::query("UPDATE orders SET desk_id = $1 WHERE id = $2")
            .bind(desk_id)
            .bind(order_id)
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("order {order_id}")));
        }
        Ok(())
    }

    async fn insert_order_items(&mut self, items: &[OrderItem]) -> StoreResult<()> {
        for item in items {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, menu_item_id, name, price, quantity, customizations,
                    special_instructions, customization_cost
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(item.id)
            .bind(item.order_id)
            .bind(item.menu_item_id)
            .bind(&item.name)
            .bind(item.price)
            .bind(item.quantity)
            .bind(Json(&item.customizations))
            .bind(&item.special_instructions)
            .bind(item.customization_cost)
            .execute(&mut *self.tx)
            .await?;
        }
        Ok(())
    }

    async fn get_desk(&mut self, shop_id: i64, id: i64) -> StoreResult<Option<Desk>> {
        let row: Option<DeskRow> = sqlx::query_as(concat!(
            "SELECT ",
            desk_columns!(),
            " FROM desks WHERE shop_id = $1 AND id = $2 FOR UPDATE"
        ))
        .bind(shop_id)
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(Desk::try_from).transpose()
    }

    async fn find_desk_by_name(&mut self, shop_id: i64, name: &str) -> StoreResult<Option<Desk>> {
        let row: Option<DeskRow> = sqlx::query_as(concat!(
            "SELECT ",
            desk_columns!(),
            " FROM desks WHERE shop_id = $1 AND name = $2"
        ))
        .bind(shop_id)
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(Desk::try_from).transpose()
    }

    async fn insert_desk_if_absent(&mut self, desk: &Desk) -> StoreResult<Desk> {
        // Waits on a concurrent uncommitted insert of the same name
        let inserted: Option<DeskRow> = sqlx::query_as(concat!(
            "INSERT INTO desks (",
            desk_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7)",
            " ON CONFLICT (shop_id, name) DO NOTHING RETURNING ",
            desk_columns!()
        ))
        .bind(desk.id)
        .bind(desk.shop_id)
        .bind(&desk.name)
        .bind(desk.capacity)
        .bind(desk.status.as_str())
        .bind(&desk.area)
        .bind(desk.created_at)
        .fetch_optional(&mut *self.tx)
        .await?;
        if let Some(row) = inserted {
            return Desk::try_from(row);
        }
        self.find_desk_by_name(desk.shop_id, &desk.name)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("desk '{}'", desk.name)))
    }

    async fn set_desk_status(
        &mut self,
        shop_id: i64,
        id: i64,
        status: DeskStatus,
    ) -> StoreResult<bool> {
        set_desk_status(&mut *self.tx, shop_id, id, status).await
    }

    async fn clear_cart(&mut self, session_id: &str) -> StoreResult<u64> {
        clear_cart(&mut *self.tx, session_id).await
    }

    async fn settle_desk_orders(
        &mut self,
        shop_id: i64,
        desk: &DeskRef,
        now: i64,
    ) -> StoreResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(concat!(
            "UPDATE orders SET status = 'completed', paid = TRUE, updated_at = $1",
            " WHERE shop_id = $2 AND (desk_id = $3 OR table_number = $4) AND ",
            occupying!(),
            " RETURNING ",
            order_columns!()
        ))
        .bind(now)
        .bind(shop_id)
        .bind(desk.desk_id)
        .bind(&desk.table_number)
        .fetch_all(&mut *self.tx)
        .await?;
        let mut orders = orders_from_rows(rows)?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

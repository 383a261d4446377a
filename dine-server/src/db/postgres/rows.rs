//! Row types and their conversion into shared models

use shared::models::{
    CartItem, Category, Customer, CustomizationOption, CustomizationSelection, Desk, MenuItem,
    Order, OrderItem, Session, Shop, validate_schema,
};
use sqlx::types::Json;

use crate::db::StoreError;

fn parse_enum<T: std::str::FromStr>(
    table: &str,
    id: impl std::fmt::Display,
    raw: &str,
) -> Result<T, StoreError> {
    raw.parse()
        .map_err(|_| StoreError::Corrupt(format!("{table} {id}: unexpected status '{raw}'")))
}

#[derive(sqlx::FromRow)]
pub(super) struct ShopRow {
    id: i64,
    name: String,
    slug: String,
    created_at: i64,
}

impl From<ShopRow> for Shop {
    fn from(row: ShopRow) -> Self {
        Shop {
            id: row.id,
            name: row.name,
            slug: row.slug,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct CustomerRow {
    id: i64,
    shop_id: i64,
    name: String,
    email: Option<String>,
    phone: Option<String>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            shop_id: row.shop_id,
            name: row.name,
            email: row.email,
            phone: row.phone,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct CategoryRow {
    id: i64,
    shop_id: i64,
    name: String,
    sort_order: i32,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            shop_id: row.shop_id,
            name: row.name,
            sort_order: row.sort_order,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct MenuItemRow {
    id: i64,
    shop_id: i64,
    category_id: Option<i64>,
    name: String,
    description: Option<String>,
    price: f64,
    is_available: bool,
    customization_options: Json<serde_json::Value>,
}

impl TryFrom<MenuItemRow> for MenuItem {
    type Error = StoreError;

    /// Decodes the JSONB schema into the tagged union and checks it
    fn try_from(row: MenuItemRow) -> Result<Self, Self::Error> {
        let options: Vec<CustomizationOption> = serde_json::from_value(row.customization_options.0)
            .map_err(|e| StoreError::Corrupt(format!("menu item {}: {e}", row.id)))?;
        validate_schema(&options)
            .map_err(|e| StoreError::Corrupt(format!("menu item {}: {e}", row.id)))?;
        Ok(MenuItem {
            id: row.id,
            shop_id: row.shop_id,
            category_id: row.category_id,
            name: row.name,
            description: row.description,
            price: row.price,
            is_available: row.is_available,
            customization_options: options,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct DeskRow {
    id: i64,
    shop_id: i64,
    name: String,
    capacity: i32,
    status: String,
    area: Option<String>,
    created_at: i64,
}

impl TryFrom<DeskRow> for Desk {
    type Error = StoreError;

    fn try_from(row: DeskRow) -> Result<Self, Self::Error> {
        Ok(Desk {
            status: parse_enum("desk", row.id, &row.status)?,
            id: row.id,
            shop_id: row.shop_id,
            name: row.name,
            capacity: row.capacity,
            area: row.area,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct OrderRow {
    id: i64,
    shop_id: i64,
    customer_id: Option<i64>,
    desk_id: Option<i64>,
    session_id: Option<String>,
    table_number: Option<String>,
    status: String,
    subtotal: f64,
    service_fee: f64,
    total: f64,
    paid: bool,
    customer_name: Option<String>,
    customer_phone: Option<String>,
    notes: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            status: parse_enum("order", row.id, &row.status)?,
            id: row.id,
            shop_id: row.shop_id,
            customer_id: row.customer_id,
            desk_id: row.desk_id,
            session_id: row.session_id,
            table_number: row.table_number,
            subtotal: row.subtotal,
            service_fee: row.service_fee,
            total: row.total,
            paid: row.paid,
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(super) fn orders_from_rows(rows: Vec<OrderRow>) -> Result<Vec<Order>, StoreError> {
    rows.into_iter().map(Order::try_from).collect()
}

#[derive(sqlx::FromRow)]
pub(super) struct OrderItemRow {
    id: i64,
    order_id: i64,
    menu_item_id: i64,
    name: String,
    price: f64,
    quantity: i32,
    customizations: Json<CustomizationSelection>,
    special_instructions: Option<String>,
    customization_cost: f64,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            order_id: row.order_id,
            menu_item_id: row.menu_item_id,
            name: row.name,
            price: row.price,
            quantity: row.quantity,
            customizations: row.customizations.0,
            special_instructions: row.special_instructions,
            customization_cost: row.customization_cost,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct CartItemRow {
    id: i64,
    session_id: String,
    shop_id: i64,
    menu_item_id: i64,
    quantity: i32,
    customizations: Json<CustomizationSelection>,
    special_instructions: Option<String>,
    created_at: i64,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        CartItem {
            id: row.id,
            session_id: row.session_id,
            shop_id: row.shop_id,
            menu_item_id: row.menu_item_id,
            quantity: row.quantity,
            customizations: row.customizations.0,
            special_instructions: row.special_instructions,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct SessionRow {
    id: String,
    table_number: String,
    desk_id: Option<i64>,
    shop_id: i64,
    status: String,
    created_at: i64,
    last_activity: i64,
    expires_at: i64,
    metadata: Json<serde_json::Value>,
}

impl TryFrom<SessionRow> for Session {
    type Error = StoreError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(Session {
            status: parse_enum("session", &row.id, &row.status)?,
            id: row.id,
            table_number: row.table_number,
            desk_id: row.desk_id,
            shop_id: row.shop_id,
            created_at: row.created_at,
            last_activity: row.last_activity,
            expires_at: row.expires_at,
            metadata: row.metadata.0,
        })
    }
}

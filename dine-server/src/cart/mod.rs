//! Cart
//!
//! Staging rows for a session's next order. Lines merge when menu item,
//! customizations and special instructions are all equal; the selection map
//! is a `BTreeMap`, so equal selections compare equal regardless of the
//! order the client sent them in.
//!
//! Prices are always read from the store, never from the menu cache.

use rust_decimal::Decimal;
use serde_json::Value;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    CartItem, CartItemAdd, CartLine, CartSummary, CheckoutRequest, CustomizationSelection,
    MenuItem, OrderCreate, OrderDetail, OrderItemCreate, Session,
};
use shared::util::{now_millis, snowflake_id};

use crate::db::DynStore;
use crate::error::ServiceResult;
use crate::orders::OrderService;
use crate::pricing::customization::customization_delta;
use crate::pricing::{order_totals, to_decimal, to_f64, validate_selection};

/// Upper bound for a single line's quantity
pub const MAX_LINE_QUANTITY: i32 = 99;

#[derive(Clone)]
pub struct CartService {
    store: DynStore,
    orders: OrderService,
    service_fee_percent: f64,
}

impl CartService {
    pub fn new(store: DynStore, orders: OrderService, service_fee_percent: f64) -> Self {
        Self {
            store,
            orders,
            service_fee_percent,
        }
    }

    /// Add a line, merging into an identical existing line
    pub async fn add(&self, session: &Session, req: CartItemAdd) -> ServiceResult<CartItem> {
        check_quantity(req.quantity, 1)?;
        let item = self.available_item(session.shop_id, req.menu_item_id).await?;

        let customizations = normalize_selection(req.customizations);
        if !validate_selection(&item.customization_options, &customizations) {
            return Err(AppError::new(ErrorCode::InvalidCustomization)
                .with_detail("menu_item_id", item.id)
                .into());
        }
        let instructions = normalize_text(req.special_instructions);

        let existing = self.store.list_cart_items(&session.id).await?;
        if let Some(line) = existing
            .iter()
            .find(|l| l.merges_with(item.id, &customizations, instructions.as_deref()))
        {
            let quantity = line.quantity + req.quantity;
            check_quantity(quantity, 1)?;
            let merged = self
                .store
                .update_cart_quantity(&session.id, line.id, quantity)
                .await?
                .ok_or_else(|| cart_item_not_found(line.id))?;
            tracing::debug!(
                session_id = %session.id,
                cart_item_id = line.id,
                quantity,
                "Cart line merged"
            );
            return Ok(merged);
        }

        let line = CartItem {
            id: snowflake_id(),
            session_id: session.id.clone(),
            shop_id: session.shop_id,
            menu_item_id: item.id,
            quantity: req.quantity,
            customizations,
            special_instructions: instructions,
            created_at: now_millis(),
        };
        self.store.insert_cart_item(&line).await?;
        tracing::debug!(session_id = %session.id, cart_item_id = line.id, "Cart line added");
        Ok(line)
    }

    /// Set a line's quantity; 0 removes the line and returns `None`
    pub async fn update_quantity(
        &self,
        session: &Session,
        cart_item_id: i64,
        quantity: i32,
    ) -> ServiceResult<Option<CartItem>> {
        check_quantity(quantity, 0)?;
        if quantity == 0 {
            self.remove(session, cart_item_id).await?;
            return Ok(None);
        }
        let line = self
            .store
            .update_cart_quantity(&session.id, cart_item_id, quantity)
            .await?
            .ok_or_else(|| cart_item_not_found(cart_item_id))?;
        Ok(Some(line))
    }

    pub async fn remove(&self, session: &Session, cart_item_id: i64) -> ServiceResult<()> {
        if !self.store.delete_cart_item(&session.id, cart_item_id).await? {
            return Err(cart_item_not_found(cart_item_id).into());
        }
        Ok(())
    }

    /// Number of lines removed
    pub async fn clear(&self, session: &Session) -> ServiceResult<u64> {
        Ok(self.store.clear_cart(&session.id).await?)
    }

    /// Priced cart. Lines whose menu item no longer exists are left out.
    pub async fn view(&self, session: &Session) -> ServiceResult<CartSummary> {
        let lines = self.priced_lines(session).await?;
        Ok(self.summarize(lines.into_iter().map(|(line, _)| line).collect()))
    }

    /// Turn the cart into an order for the session's table
    pub async fn checkout(
        &self,
        session: &Session,
        req: CheckoutRequest,
    ) -> ServiceResult<OrderDetail> {
        let lines = self.priced_lines(session).await?;
        if lines.is_empty() {
            return Err(AppError::new(ErrorCode::CartEmpty).into());
        }
        if let Some((_, item)) = lines.iter().find(|(_, item)| !item.is_available) {
            return Err(AppError::new(ErrorCode::MenuItemUnavailable)
                .with_detail("menu_item_id", item.id)
                .with_detail("name", item.name.clone())
                .into());
        }

        let items: Vec<OrderItemCreate> = lines
            .iter()
            .map(|(line, item)| OrderItemCreate {
                menu_item_id: item.id,
                name: item.name.clone(),
                price: line.unit_price,
                quantity: line.item.quantity,
                customizations: line.item.customizations.clone(),
                special_instructions: line.item.special_instructions.clone(),
                customization_cost: line.customization_cost,
            })
            .collect();
        let summary = self.summarize(lines.into_iter().map(|(line, _)| line).collect());

        let data = OrderCreate {
            shop_id: session.shop_id,
            customer_id: req.customer_id,
            session_id: Some(session.id.clone()),
            table_number: Some(session.table_number.clone()),
            subtotal: summary.subtotal,
            service_fee: summary.service_fee,
            total: summary.total,
            customer_name: normalize_text(req.customer_name),
            customer_phone: normalize_text(req.customer_phone),
            notes: normalize_text(req.notes),
        };
        self.orders.create(data, items).await
    }

    async fn available_item(&self, shop_id: i64, menu_item_id: i64) -> ServiceResult<MenuItem> {
        let item = self
            .store
            .get_menu_item(shop_id, menu_item_id)
            .await?
            .ok_or_else(|| {
                AppError::new(ErrorCode::MenuItemNotFound)
                    .with_detail("menu_item_id", menu_item_id)
            })?;
        if !item.is_available {
            return Err(AppError::new(ErrorCode::MenuItemUnavailable)
                .with_detail("menu_item_id", menu_item_id)
                .into());
        }
        Ok(item)
    }

    async fn priced_lines(&self, session: &Session) -> ServiceResult<Vec<(CartLine, MenuItem)>> {
        let rows = self.store.list_cart_items(&session.id).await?;
        let mut lines = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(item) = self
                .store
                .get_menu_item(session.shop_id, row.menu_item_id)
                .await?
            else {
                tracing::warn!(
                    session_id = %session.id,
                    menu_item_id = row.menu_item_id,
                    "Cart line references a missing menu item"
                );
                continue;
            };
            let delta = customization_delta(&item.customization_options, &row.customizations);
            let unit = to_decimal(item.price) + delta;
            let line = CartLine {
                name: item.name.clone(),
                base_price: item.price,
                customization_cost: to_f64(delta),
                unit_price: to_f64(unit),
                line_total: to_f64(unit * Decimal::from(row.quantity)),
                item: row,
            };
            lines.push((line, item));
        }
        Ok(lines)
    }

    fn summarize(&self, items: Vec<CartLine>) -> CartSummary {
        let subtotal: Decimal = items.iter().map(|l| to_decimal(l.line_total)).sum();
        let totals = order_totals(subtotal, self.service_fee_percent);
        CartSummary {
            items,
            subtotal: totals.subtotal,
            service_fee: totals.service_fee,
            total: totals.total,
        }
    }
}

fn check_quantity(quantity: i32, min: i32) -> Result<(), AppError> {
    if (min..=MAX_LINE_QUANTITY).contains(&quantity) {
        return Ok(());
    }
    Err(AppError::with_message(
        ErrorCode::InvalidQuantity,
        format!("quantity must be between {min} and {MAX_LINE_QUANTITY}"),
    )
    .with_detail("quantity", quantity))
}

/// `null` means "not selected" and must not split otherwise equal lines
fn normalize_selection(selection: CustomizationSelection) -> CustomizationSelection {
    selection
        .into_iter()
        .filter(|(_, v)| !v.is_null() && *v != Value::Bool(false))
        .collect()
}

fn normalize_text(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

fn cart_item_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::CartItemNotFound).with_detail("cart_item_id", id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_selection_normalization() {
        let sel: CustomizationSelection = serde_json::from_value(json!({
            "size": "large",
            "cheese": false,
            "sauce": null,
            "spicy": true,
        }))
        .unwrap();
        let normalized = normalize_selection(sel);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized["size"], json!("large"));
        assert_eq!(normalized["spicy"], json!(true));
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(check_quantity(1, 1).is_ok());
        assert!(check_quantity(0, 0).is_ok());
        assert!(check_quantity(0, 1).is_err());
        assert!(check_quantity(-1, 0).is_err());
        assert!(check_quantity(MAX_LINE_QUANTITY + 1, 1).is_err());
    }

    #[test]
    fn test_blank_text_dropped() {
        assert_eq!(normalize_text(Some("  ".into())), None);
        assert_eq!(
            normalize_text(Some(" no onions ".into())),
            Some("no onions".to_string())
        );
    }
}

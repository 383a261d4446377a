//! Cart Model

use serde::{Deserialize, Serialize};

use super::menu::CustomizationSelection;

/// Pre-order staging row, keyed by (session, menu item, customizations,
/// special instructions)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub session_id: String,
    pub shop_id: i64,
    pub menu_item_id: i64,
    pub quantity: i32,
    #[serde(default)]
    pub customizations: CustomizationSelection,
    pub special_instructions: Option<String>,
    pub created_at: i64,
}

impl CartItem {
    /// Same merge key as another line
    pub fn merges_with(
        &self,
        menu_item_id: i64,
        customizations: &CustomizationSelection,
        special_instructions: Option<&str>,
    ) -> bool {
        self.menu_item_id == menu_item_id
            && &self.customizations == customizations
            && self.special_instructions.as_deref() == special_instructions
    }
}

/// Add to cart payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemAdd {
    pub menu_item_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(default)]
    pub customizations: CustomizationSelection,
    pub special_instructions: Option<String>,
}

fn default_quantity() -> i32 {
    1
}

/// Quantity change payload (0 removes the line)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartQuantityUpdate {
    pub quantity: i32,
}

/// Priced cart line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(flatten)]
    pub item: CartItem,
    pub name: String,
    pub base_price: f64,
    pub customization_cost: f64,
    /// base_price + customization_cost
    pub unit_price: f64,
    pub line_total: f64,
}

/// Priced cart
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CartSummary {
    pub items: Vec<CartLine>,
    pub subtotal: f64,
    pub service_fee: f64,
    pub total: f64,
}

impl CartSummary {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Checkout payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub customer_id: Option<i64>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_payload_defaults() {
        let add: CartItemAdd = serde_json::from_str(r#"{"menu_item_id": 7}"#).unwrap();
        assert_eq!(add.quantity, 1);
        assert!(add.customizations.is_empty());
        assert!(add.special_instructions.is_none());
    }

    #[test]
    fn test_merge_key_ignores_selection_order() {
        let a: CustomizationSelection =
            serde_json::from_str(r#"{"size":"large","cheese":true}"#).unwrap();
        let b: CustomizationSelection =
            serde_json::from_str(r#"{"cheese":true,"size":"large"}"#).unwrap();
        let item = CartItem {
            id: 1,
            session_id: "s".to_string(),
            shop_id: 1,
            menu_item_id: 7,
            quantity: 1,
            customizations: a,
            special_instructions: None,
            created_at: 0,
        };
        assert!(item.merges_with(7, &b, None));
        assert!(!item.merges_with(7, &b, Some("no onions")));
        assert!(!item.merges_with(7, &CustomizationSelection::new(), None));
    }
}

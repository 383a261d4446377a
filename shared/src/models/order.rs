//! Order Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::customer::Customer;
use super::desk::Desk;
use super::menu::CustomizationSelection;

/// Order status vocabulary: `pending | preparing | ready | completed | cancelled`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        Self::Pending,
        Self::Preparing,
        Self::Ready,
        Self::Completed,
        Self::Cancelled,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Completed and cancelled orders never move again
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Position on the kitchen path (cancelled is off-path)
    const fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Preparing => 1,
            Self::Ready => 2,
            Self::Completed => 3,
            Self::Cancelled => u8::MAX,
        }
    }

    /// Orders move forward along pending → preparing → ready → completed
    /// (steps may be skipped) or jump to cancelled from any non-terminal state.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == Self::Cancelled || next.rank() > self.rank()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status string outside the order vocabulary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidOrderStatus(pub String);

impl fmt::Display for InvalidOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid order status: {}", self.0)
    }
}

impl std::error::Error for InvalidOrderStatus {}

impl FromStr for OrderStatus {
    type Err = InvalidOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InvalidOrderStatus(s.to_string()))
    }
}

/// Occupancy policy: an order keeps its desk occupied while it is neither
/// cancelled nor paid.
///
/// Every occupancy computation, release and status side effect goes through
/// this function (and its SQL twin in the postgres store).
#[inline]
pub fn order_occupies_desk(status: OrderStatus, paid: bool) -> bool {
    status != OrderStatus::Cancelled && !paid
}

/// Order entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub shop_id: i64,
    pub customer_id: Option<i64>,
    pub desk_id: Option<i64>,
    pub session_id: Option<String>,
    pub table_number: Option<String>,
    pub status: OrderStatus,
    /// Amounts in currency unit
    pub subtotal: f64,
    pub service_fee: f64,
    pub total: f64,
    pub paid: bool,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    pub fn occupies_desk(&self) -> bool {
        order_occupies_desk(self.status, self.paid)
    }

    /// Linked to the desk by id, or historically by matching table number
    pub fn references_desk(&self, desk_id: i64, desk_name: &str) -> bool {
        self.desk_id == Some(desk_id) || self.table_number.as_deref() == Some(desk_name)
    }
}

/// Order line, frozen at order time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    pub name: String,
    /// Unit price including this line's customization cost
    pub price: f64,
    pub quantity: i32,
    #[serde(default)]
    pub customizations: CustomizationSelection,
    pub special_instructions: Option<String>,
    pub customization_cost: f64,
}

/// Order creation payload (prices already computed by the caller)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderCreate {
    pub shop_id: i64,
    pub customer_id: Option<i64>,
    pub session_id: Option<String>,
    pub table_number: Option<String>,
    pub subtotal: f64,
    pub service_fee: f64,
    pub total: f64,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}

/// Order line creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemCreate {
    pub menu_item_id: i64,
    pub name: String,
    /// Unit price including customization cost
    pub price: f64,
    pub quantity: i32,
    #[serde(default)]
    pub customizations: CustomizationSelection,
    pub special_instructions: Option<String>,
    pub customization_cost: f64,
}

/// Status update payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: String,
}

/// Order with its items and resolved relations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub customer: Option<Customer>,
    pub desk: Option<Desk>,
}

//! Customer Model

use serde::{Deserialize, Serialize};

/// Registered customer attached to an order (anonymous orders carry none)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub shop_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

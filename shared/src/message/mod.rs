//! 事件通知类型
//!
//! Events published by the server whenever order or desk state changes.
//! Staff clients receive them over SSE; nothing on the server reads them back.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Desk, DeskStatus, Order, OrderStatus};

/// Event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    OrderCreated,
    OrderStatusChanged,
    DeskStatusChanged,
    DeskReleased,
}

impl EventKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OrderCreated => "order_created",
            Self::OrderStatusChanged => "order_status_changed",
            Self::DeskStatusChanged => "desk_status_changed",
            Self::DeskReleased => "desk_released",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event envelope, scoped to one shop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DineEvent {
    pub shop_id: i64,
    pub kind: EventKind,
    pub payload: serde_json::Value,
    pub timestamp: i64,
}

impl DineEvent {
    pub fn new(shop_id: i64, kind: EventKind, payload: serde_json::Value) -> Self {
        Self {
            shop_id,
            kind,
            payload,
            timestamp: crate::util::now_millis(),
        }
    }

    pub fn order_created(order: &Order) -> Self {
        Self::new(
            order.shop_id,
            EventKind::OrderCreated,
            serde_json::to_value(order).unwrap_or_default(),
        )
    }

    pub fn order_status_changed(order: &Order, previous: OrderStatus) -> Self {
        Self::new(
            order.shop_id,
            EventKind::OrderStatusChanged,
            serde_json::json!({
                "order_id": order.id,
                "desk_id": order.desk_id,
                "previous": previous,
                "status": order.status,
            }),
        )
    }

    pub fn desk_status_changed(shop_id: i64, desk_id: i64, status: DeskStatus) -> Self {
        Self::new(
            shop_id,
            EventKind::DeskStatusChanged,
            serde_json::json!({ "desk_id": desk_id, "status": status }),
        )
    }

    pub fn desk_released(desk: &Desk, order_ids: &[i64]) -> Self {
        Self::new(
            desk.shop_id,
            EventKind::DeskReleased,
            serde_json::json!({
                "desk_id": desk.id,
                "name": desk.name,
                "order_ids": order_ids,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_wire_name() {
        let json = serde_json::to_string(&EventKind::DeskReleased).unwrap();
        assert_eq!(json, "\"desk_released\"");
        assert_eq!(EventKind::OrderStatusChanged.to_string(), "order_status_changed");
    }

    #[test]
    fn test_desk_status_event() {
        let event = DineEvent::desk_status_changed(3, 9, DeskStatus::Occupied);
        assert_eq!(event.shop_id, 3);
        assert_eq!(event.payload["desk_id"], 9);
        assert_eq!(event.payload["status"], "occupied");
    }
}

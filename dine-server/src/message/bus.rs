//! 事件总线
//!
//! ```text
//! OrderService / DeskService ──▶ publish() ──▶ broadcast::Sender<DineEvent>
//!                                                 │
//!                                     ┌───────────┴───────────┐
//!                                     ▼                       ▼
//!                              SSE subscriber           SSE subscriber
//!                              (shop 1 staff)           (shop 2 staff)
//! ```
//!
//! Publishing is fire-and-forget: no subscriber, or a lagging one, never
//! affects the operation that produced the event.

use shared::message::DineEvent;
use tokio::sync::broadcast;

/// Default capacity of the broadcast channel
const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DineEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event, returning the number of receivers it reached
    pub fn publish(&self, event: DineEvent) -> usize {
        let kind = event.kind;
        let shop_id = event.shop_id;
        match self.tx.send(event) {
            Ok(receivers) => {
                tracing::debug!(%kind, shop_id, receivers, "Event published");
                receivers
            }
            Err(_) => {
                tracing::trace!(%kind, shop_id, "Event dropped, no subscribers");
                0
            }
        }
    }

    /// Subscribe to every event; filter by shop on the receiving side
    pub fn subscribe(&self) -> broadcast::Receiver<DineEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::message::EventKind;
    use shared::models::DeskStatus;

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(DineEvent::desk_status_changed(1, 2, DeskStatus::Occupied)), 0);
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = EventBus::with_capacity(8);
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(DineEvent::desk_status_changed(1, 2, DeskStatus::Available));
        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, EventKind::DeskStatusChanged);
        assert_eq!(event.shop_id, 1);
    }
}

//! Server-Sent Events stream of a shop's order/desk events

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    Extension,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use tokio::sync::broadcast::{Receiver, error::RecvError};

use crate::auth::StaffIdentity;
use crate::state::AppState;

const KEEP_ALIVE: Duration = Duration::from_secs(15);

/// GET /api/staff/events
pub async fn stream(
    State(state): State<AppState>,
    Extension(staff): Extension<StaffIdentity>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.bus.subscribe();
    tracing::debug!(shop_id = staff.shop_id, "Event stream opened");
    Sse::new(shop_events(rx, staff.shop_id))
        .keep_alive(KeepAlive::new().interval(KEEP_ALIVE))
}

fn shop_events(
    rx: Receiver<shared::DineEvent>,
    shop_id: i64,
) -> impl Stream<Item = Result<Event, Infallible>> {
    futures::stream::unfold(rx, move |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) if event.shop_id == shop_id => {
                    let sse = Event::default()
                        .event(event.kind.as_str())
                        .json_data(&event)
                        .unwrap_or_else(|_| Event::default().comment("unserializable event"));
                    return Some((Ok(sse), rx));
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(shop_id, skipped, "Event stream lagged");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

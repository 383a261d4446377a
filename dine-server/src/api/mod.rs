//! API routes for dine-server

pub mod cart;
pub mod desks;
pub mod events;
pub mod extract;
pub mod health;
pub mod maintenance;
pub mod menu;
pub mod orders;
pub mod sessions;

use axum::routing::{get, patch, post};
use axum::{Router, middleware};
use http::{HeaderName, HeaderValue};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::{session_middleware, session_orders_middleware, staff_auth_middleware};
use crate::state::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// In-flight request cap (open SSE streams count against it)
const MAX_CONCURRENT_REQUESTS: usize = 512;

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Customer routes (X-Session-Id)
    let customer = Router::new()
        .route("/api/sessions/current", get(sessions::current))
        .route("/api/menu/categories", get(menu::categories))
        .route("/api/menu/items", get(menu::items))
        .route(
            "/api/cart",
            get(cart::view).post(cart::add).delete(cart::clear),
        )
        .route(
            "/api/cart/{id}",
            patch(cart::update_quantity).delete(cart::remove),
        )
        .route("/api/cart/checkout", post(cart::checkout))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    // Order history outlives the session's checkout
    let history = Router::new()
        .route("/api/orders/session", get(orders::for_session))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_orders_middleware,
        ));

    // Staff routes (Bearer JWT)
    let staff = Router::new()
        .route("/api/staff/orders", get(orders::list))
        .route("/api/staff/orders/{id}", get(orders::get_by_id))
        .route("/api/staff/orders/{id}/status", patch(orders::update_status))
        .route("/api/staff/customers/{id}/orders", get(orders::for_customer))
        .route("/api/staff/desks", get(desks::list).post(desks::create))
        .route(
            "/api/staff/desks/{id}",
            get(desks::get_by_id)
                .patch(desks::update)
                .delete(desks::delete),
        )
        .route("/api/staff/desks/{id}/status", patch(desks::toggle_status))
        .route("/api/staff/desks/{id}/release", post(desks::release))
        .route("/api/staff/desks/{id}/reset", post(desks::reset))
        .route(
            "/api/staff/maintenance/sessions/cleanup-expired",
            post(maintenance::cleanup_expired),
        )
        .route(
            "/api/staff/maintenance/sessions/cleanup-problematic",
            post(maintenance::cleanup_problematic),
        )
        .route("/api/staff/events", get(events::stream))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            staff_auth_middleware,
        ));

    // Public
    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/api/sessions", post(sessions::start));

    Router::new()
        .merge(public)
        .merge(customer)
        .merge(history)
        .merge(staff)
        .with_state(state)
        .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
}

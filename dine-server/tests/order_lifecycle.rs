// dine-server/tests/order_lifecycle.rs
// 订单生命周期集成测试

mod common;

use common::*;
use dine_server::db::Store;
use shared::error::ErrorCode;
use shared::message::EventKind;
use shared::models::{
    CheckoutRequest, DeskStatus, OrderCreate, OrderItemCreate, OrderStatus, SessionStatus,
};
use shared::util::now_millis;

fn line(menu_item_id: i64, price: f64, quantity: i32) -> OrderItemCreate {
    OrderItemCreate {
        menu_item_id,
        name: format!("item-{menu_item_id}"),
        price,
        quantity,
        customizations: Default::default(),
        special_instructions: None,
        customization_cost: 0.0,
    }
}

fn at_table(table: &str) -> OrderCreate {
    OrderCreate {
        shop_id: SHOP,
        table_number: Some(table.to_string()),
        subtotal: 10.0,
        service_fee: 1.0,
        total: 11.0,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_create_validation() {
    let app = setup().await;
    let orders = &app.state.orders;

    assert_eq!(
        code_of(orders.create(at_table("V1"), Vec::new()).await),
        ErrorCode::OrderEmpty
    );
    assert_eq!(
        code_of(orders.create(at_table("V1"), vec![line(SALAD, 8.0, 0)]).await),
        ErrorCode::InvalidQuantity
    );
    assert_eq!(
        code_of(orders.create(at_table("V-1"), vec![line(SALAD, 8.0, 1)]).await),
        ErrorCode::InvalidTableNumber
    );

    // Nothing was written
    assert!(app.store.list_desks(SHOP).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_order_without_table_has_no_desk() {
    let app = setup().await;
    let mut takeaway = at_table("");
    takeaway.customer_id = Some(CUSTOMER);
    takeaway.customer_name = Some("Ada".into());

    let detail = app
        .state
        .orders
        .create(takeaway, vec![line(SALAD, 8.0, 2)])
        .await
        .unwrap();
    assert_eq!(detail.order.table_number, None);
    assert_eq!(detail.order.desk_id, None);
    assert!(detail.desk.is_none());
    assert_eq!(detail.customer.map(|c| c.id), Some(CUSTOMER));
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.order.status, OrderStatus::Pending);
    assert!(!detail.order.paid);
}

#[tokio::test]
async fn test_checkout_consumes_cart_and_session() {
    let app = setup().await;
    let session = app.session("K1").await;
    app.add(&session, SALAD, 2).await;
    app.add(&session, BURGER, 1).await;

    let detail = app
        .state
        .cart
        .checkout(&session, CheckoutRequest::default())
        .await
        .unwrap();
    assert_eq!(detail.items.len(), 2);
    assert_eq!(detail.order.session_id.as_deref(), Some(session.id.as_str()));
    assert_eq!(detail.order.table_number.as_deref(), Some("K1"));

    assert!(app.store.list_cart_items(&session.id).await.unwrap().is_empty());
    assert_eq!(app.state.sessions.get(&session.id).await.unwrap(), None);
    let stored = app.store.list_sessions().await.unwrap();
    assert!(stored
        .iter()
        .any(|s| s.id == session.id && s.status == SessionStatus::Completed));
}

#[tokio::test]
async fn test_failed_items_roll_back_everything() {
    let app = setup().await;
    let session = app.session("F9").await;
    app.add(&session, SALAD, 1).await;

    app.store.set_fail_order_items(true);
    let result = app
        .state
        .cart
        .checkout(&session, CheckoutRequest::default())
        .await;
    assert_eq!(code_of(result), ErrorCode::DatabaseError);
    app.store.set_fail_order_items(false);

    assert!(app.store.list_orders(&dine_server::db::OrderFilter::shop(SHOP)).await.unwrap().is_empty());
    assert!(app.store.list_desks(SHOP).await.unwrap().is_empty());
    assert_eq!(app.store.list_cart_items(&session.id).await.unwrap().len(), 1);
    assert!(app.store.find_live_session(&session.id, now_millis()).await.unwrap().is_some());

    // A retry goes through
    let detail = app
        .state
        .cart
        .checkout(&session, CheckoutRequest::default())
        .await
        .unwrap();
    assert_eq!(detail.desk.map(|d| d.name), Some("F9".to_string()));
}

#[tokio::test]
async fn test_terminal_status_frees_desk_only_when_last() {
    let app = setup().await;
    let first = app
        .state
        .orders
        .create(at_table("M1"), vec![line(SALAD, 8.0, 1)])
        .await
        .unwrap();
    let second = app
        .state
        .orders
        .create(at_table("M1"), vec![line(SALAD, 8.0, 1)])
        .await
        .unwrap();
    let desk_id = first.order.desk_id.unwrap();

    app.state
        .orders
        .update_status(SHOP, first.order.id, "cancelled")
        .await
        .unwrap();
    let desk = app.store.get_desk(SHOP, desk_id).await.unwrap().unwrap();
    assert_eq!(desk.status, DeskStatus::Occupied);

    let mut events = app.state.bus.subscribe();
    app.state
        .orders
        .update_status(SHOP, second.order.id, "cancelled")
        .await
        .unwrap();
    let desk = app.store.get_desk(SHOP, desk_id).await.unwrap().unwrap();
    assert_eq!(desk.status, DeskStatus::Available);

    let freed = events.try_recv().unwrap();
    assert_eq!(freed.kind, EventKind::DeskStatusChanged);
    assert_eq!(freed.payload["status"], "available");
    let changed = events.try_recv().unwrap();
    assert_eq!(changed.kind, EventKind::OrderStatusChanged);
    assert_eq!(changed.payload["previous"], "pending");
    assert_eq!(changed.payload["status"], "cancelled");
}

#[tokio::test]
async fn test_status_transitions() {
    let app = setup().await;
    let orders = &app.state.orders;
    let detail = orders
        .create(at_table("N1"), vec![line(SALAD, 8.0, 1)])
        .await
        .unwrap();
    let id = detail.order.id;

    assert_eq!(
        code_of(orders.update_status(SHOP, id, "eaten").await),
        ErrorCode::OrderInvalidStatus
    );
    assert_eq!(
        code_of(orders.update_status(SHOP, 424242, "ready").await),
        ErrorCode::OrderNotFound
    );
    assert_eq!(
        code_of(orders.update_status(OTHER_SHOP, id, "ready").await),
        ErrorCode::OrderNotFound
    );

    let ready = orders.update_status(SHOP, id, "ready").await.unwrap();
    assert_eq!(ready.status, OrderStatus::Ready);
    // Same status is a no-op
    assert_eq!(orders.update_status(SHOP, id, "ready").await.unwrap().status, OrderStatus::Ready);
    assert_eq!(
        code_of(orders.update_status(SHOP, id, "preparing").await),
        ErrorCode::OrderInvalidStatus
    );

    let done = orders.update_status(SHOP, id, "completed").await.unwrap();
    assert_eq!(done.status, OrderStatus::Completed);
    assert_eq!(
        code_of(orders.update_status(SHOP, id, "cancelled").await),
        ErrorCode::OrderAlreadyCompleted
    );
}

#[tokio::test]
async fn test_order_reads() {
    let app = setup().await;
    let session = app.session("Q1").await;
    app.add(&session, SALAD, 1).await;
    let placed = app
        .state
        .cart
        .checkout(
            &session,
            CheckoutRequest {
                customer_id: Some(CUSTOMER),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let other = app
        .state
        .orders
        .create(at_table("Q2"), vec![line(SALAD, 8.0, 1)])
        .await
        .unwrap();
    app.state
        .orders
        .update_status(SHOP, other.order.id, "preparing")
        .await
        .unwrap();

    let for_session = app
        .state
        .orders
        .list_for_session(SHOP, &session.id)
        .await
        .unwrap();
    assert_eq!(for_session.len(), 1);
    assert_eq!(for_session[0].order.id, placed.order.id);
    assert_eq!(for_session[0].items.len(), 1);
    assert_eq!(for_session[0].customer.as_ref().map(|c| c.id), Some(CUSTOMER));
    assert_eq!(for_session[0].desk.as_ref().map(|d| d.name.as_str()), Some("Q1"));

    let preparing = app.state.orders.list(SHOP, Some("preparing")).await.unwrap();
    assert_eq!(preparing.len(), 1);
    assert_eq!(preparing[0].order.id, other.order.id);
    assert_eq!(app.state.orders.list(SHOP, None).await.unwrap().len(), 2);
    assert!(app.state.orders.list(OTHER_SHOP, None).await.unwrap().is_empty());
    assert_eq!(
        code_of(app.state.orders.list(SHOP, Some("lost")).await),
        ErrorCode::OrderInvalidStatus
    );

    let by_customer = app.state.orders.list_for_customer(SHOP, CUSTOMER).await.unwrap();
    assert_eq!(by_customer.len(), 1);

    // Paid orders drop out of the session view
    let desk_id = placed.order.desk_id.unwrap();
    app.state.desks.complete_and_pay(SHOP, desk_id).await.unwrap();
    assert!(app
        .state
        .orders
        .list_for_session(SHOP, &session.id)
        .await
        .unwrap()
        .is_empty());

    let fetched = app.state.orders.get(SHOP, placed.order.id).await.unwrap();
    assert!(fetched.order.paid);
    assert_eq!(
        code_of(app.state.orders.get(OTHER_SHOP, placed.order.id).await),
        ErrorCode::OrderNotFound
    );
}

#[tokio::test]
async fn test_creation_events() {
    let app = setup().await;
    let mut events = app.state.bus.subscribe();

    let first = app
        .state
        .orders
        .create(at_table("W1"), vec![line(SALAD, 8.0, 1)])
        .await
        .unwrap();
    let created = events.try_recv().unwrap();
    assert_eq!(created.kind, EventKind::OrderCreated);
    assert_eq!(created.shop_id, SHOP);
    assert_eq!(created.payload["id"], first.order.id);
    let occupied = events.try_recv().unwrap();
    assert_eq!(occupied.kind, EventKind::DeskStatusChanged);
    assert_eq!(occupied.payload["status"], "occupied");

    // Desk already occupied: no second desk event
    app.state
        .orders
        .create(at_table("W1"), vec![line(SALAD, 8.0, 1)])
        .await
        .unwrap();
    assert_eq!(events.try_recv().unwrap().kind, EventKind::OrderCreated);
    assert!(events.try_recv().is_err());
}

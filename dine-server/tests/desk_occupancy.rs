// dine-server/tests/desk_occupancy.rs
// 桌台占用集成测试

mod common;

use common::*;
use dine_server::db::Store;
use shared::error::ErrorCode;
use shared::models::{
    Desk, DeskCreate, DeskStatus, DeskUpdate, Order, OrderCreate, OrderItemCreate, OrderStatus,
};
use shared::util::{now_millis, snowflake_id};

fn salad_line() -> OrderItemCreate {
    OrderItemCreate {
        menu_item_id: SALAD,
        name: "Salad".into(),
        price: 8.0,
        quantity: 1,
        customizations: Default::default(),
        special_instructions: None,
        customization_cost: 0.0,
    }
}

fn walk_in(table: &str) -> OrderCreate {
    OrderCreate {
        shop_id: SHOP,
        table_number: Some(table.to_string()),
        subtotal: 8.0,
        service_fee: 0.8,
        total: 8.8,
        ..Default::default()
    }
}

/// Order linked only by table number, as rows written before desk ids existed
async fn insert_legacy_order(app: &TestApp, table: &str) -> Order {
    let now = now_millis();
    let order = Order {
        id: snowflake_id(),
        shop_id: SHOP,
        customer_id: None,
        desk_id: None,
        session_id: None,
        table_number: Some(table.to_string()),
        status: OrderStatus::Preparing,
        subtotal: 5.0,
        service_fee: 0.5,
        total: 5.5,
        paid: false,
        customer_name: None,
        customer_phone: None,
        notes: None,
        created_at: now,
        updated_at: now,
    };
    let mut tx = app.store.begin().await.unwrap();
    tx.insert_order(&order).await.unwrap();
    tx.commit().await.unwrap();
    order
}

#[tokio::test]
async fn test_order_provisions_desk() {
    let app = setup().await;
    assert!(app.state.desks.list_with_status(SHOP).await.unwrap().is_empty());

    let detail = app
        .state
        .orders
        .create(walk_in("T7"), vec![salad_line()])
        .await
        .unwrap();
    let desk = detail.desk.expect("desk provisioned");
    assert_eq!(desk.name, "T7");
    assert_eq!(desk.status, DeskStatus::Occupied);
    assert_eq!(detail.order.desk_id, Some(desk.id));

    // Second order reuses the same desk
    let second = app
        .state
        .orders
        .create(walk_in("T7"), vec![salad_line()])
        .await
        .unwrap();
    assert_eq!(second.order.desk_id, Some(desk.id));

    let views = app.state.desks.list_with_status(SHOP).await.unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].order_count, 2);
    assert_eq!(views[0].occupancy, DeskStatus::Occupied);
    assert_eq!(
        views[0].current_order.as_ref().map(|o| o.id),
        Some(second.order.id)
    );
}

#[tokio::test]
async fn test_occupancy_is_computed_not_stored() {
    let app = setup().await;
    let desk = app
        .state
        .desks
        .create(
            SHOP,
            DeskCreate {
                name: "R1".into(),
                capacity: Some(6),
                area: Some("Terrace".into()),
            },
        )
        .await
        .unwrap();

    // Stored flag says occupied, but no order occupies the desk
    let view = app
        .state
        .desks
        .toggle_status(SHOP, desk.id, DeskStatus::Occupied)
        .await
        .unwrap();
    assert_eq!(view.desk.status, DeskStatus::Occupied);
    assert_eq!(view.occupancy, DeskStatus::Available);
    assert_eq!(view.order_count, 0);

    let view = app
        .state
        .desks
        .toggle_status(SHOP, desk.id, DeskStatus::Reserved)
        .await
        .unwrap();
    assert_eq!(view.desk.status, DeskStatus::Reserved);
    assert!(!view.is_occupied());

    assert_eq!(
        code_of(app.state.desks.toggle_status(SHOP, 424242, DeskStatus::Available).await),
        ErrorCode::TableNotFound
    );
}

#[tokio::test]
async fn test_legacy_table_number_link_counts() {
    let app = setup().await;
    let desk = app
        .state
        .desks
        .create(
            SHOP,
            DeskCreate {
                name: "L2".into(),
                capacity: None,
                area: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(desk.capacity, 4);

    let legacy = insert_legacy_order(&app, "L2").await;
    let view = app.state.desks.get(SHOP, desk.id).await.unwrap();
    assert_eq!(view.order_count, 1);
    assert_eq!(view.current_order.map(|o| o.id), Some(legacy.id));

    let listed = app.state.desks.list_with_status(SHOP).await.unwrap();
    assert_eq!(listed[0].order_count, 1);

    let release = app.state.desks.complete_and_pay(SHOP, desk.id).await.unwrap();
    assert_eq!(release.orders.len(), 1);
    assert!(release.orders[0].paid);
}

#[tokio::test]
async fn test_complete_and_pay() {
    let app = setup().await;
    let first = app
        .state
        .orders
        .create(walk_in("P1"), vec![salad_line()])
        .await
        .unwrap();
    app.state
        .orders
        .create(walk_in("P1"), vec![salad_line()])
        .await
        .unwrap();
    let cancelled = app
        .state
        .orders
        .create(walk_in("P1"), vec![salad_line()])
        .await
        .unwrap();
    app.state
        .orders
        .update_status(SHOP, cancelled.order.id, "cancelled")
        .await
        .unwrap();

    let desk_id = first.order.desk_id.unwrap();
    let mut events = app.state.bus.subscribe();

    let release = app.state.desks.complete_and_pay(SHOP, desk_id).await.unwrap();
    assert_eq!(release.desk_id, desk_id);
    assert_eq!(release.orders.len(), 2);
    assert!(release
        .orders
        .iter()
        .all(|o| o.paid && o.status == OrderStatus::Completed));

    let event = events.try_recv().unwrap();
    assert_eq!(event.kind.as_str(), "desk_released");
    assert_eq!(event.payload["desk_id"], desk_id);

    let view = app.state.desks.get(SHOP, desk_id).await.unwrap();
    assert_eq!(view.order_count, 0);
    assert_eq!(view.desk.status, DeskStatus::Available);

    // Cancelled order untouched
    let untouched = app.state.orders.get(SHOP, cancelled.order.id).await.unwrap();
    assert_eq!(untouched.order.status, OrderStatus::Cancelled);
    assert!(!untouched.order.paid);

    // Releasing again settles nothing
    let again = app.state.desks.complete_and_pay(SHOP, desk_id).await.unwrap();
    assert!(again.orders.is_empty());

    assert_eq!(
        code_of(app.state.desks.complete_and_pay(SHOP, 424242).await),
        ErrorCode::TableNotFound
    );
}

#[tokio::test]
async fn test_failed_release_leaves_orders_untouched() {
    let app = setup().await;
    let settled = app
        .state
        .orders
        .create(walk_in("P2"), vec![salad_line()])
        .await
        .unwrap();
    let desk_id = settled.order.desk_id.unwrap();
    app.state.desks.complete_and_pay(SHOP, desk_id).await.unwrap();
    let paid_before = app.state.orders.get(SHOP, settled.order.id).await.unwrap().order;
    assert!(paid_before.paid);

    let pending = app
        .state
        .orders
        .create(walk_in("P2"), vec![salad_line()])
        .await
        .unwrap();
    let preparing = app
        .state
        .orders
        .create(walk_in("P2"), vec![salad_line()])
        .await
        .unwrap();
    app.state
        .orders
        .update_status(SHOP, preparing.order.id, "preparing")
        .await
        .unwrap();

    let mut events = app.state.bus.subscribe();
    app.store.set_fail_desk_status(true);
    assert_eq!(
        code_of(app.state.desks.complete_and_pay(SHOP, desk_id).await),
        ErrorCode::DatabaseError
    );
    app.store.set_fail_desk_status(false);
    assert!(events.try_recv().is_err());

    let still_pending = app.state.orders.get(SHOP, pending.order.id).await.unwrap().order;
    assert_eq!(still_pending.status, OrderStatus::Pending);
    assert!(!still_pending.paid);
    let still_preparing = app.state.orders.get(SHOP, preparing.order.id).await.unwrap().order;
    assert_eq!(still_preparing.status, OrderStatus::Preparing);
    assert!(!still_preparing.paid);
    let view = app.state.desks.get(SHOP, desk_id).await.unwrap();
    assert_eq!(view.desk.status, DeskStatus::Occupied);
    assert_eq!(view.order_count, 2);

    // Retry settles only the outstanding orders
    let release = app.state.desks.complete_and_pay(SHOP, desk_id).await.unwrap();
    let mut ids: Vec<i64> = release.orders.iter().map(|o| o.id).collect();
    ids.sort();
    let mut expected = vec![pending.order.id, preparing.order.id];
    expected.sort();
    assert_eq!(ids, expected);

    let paid_after = app.state.orders.get(SHOP, settled.order.id).await.unwrap().order;
    assert_eq!(paid_after, paid_before);
}

#[tokio::test]
async fn test_provisioning_yields_to_existing_desk() {
    let app = setup().await;
    let existing = app
        .state
        .desks
        .create(
            SHOP,
            DeskCreate {
                name: "U1".into(),
                capacity: Some(2),
                area: None,
            },
        )
        .await
        .unwrap();

    // A second provisioner that missed the first insert
    let candidate = Desk {
        id: snowflake_id(),
        shop_id: SHOP,
        name: "U1".into(),
        capacity: 4,
        status: DeskStatus::Available,
        area: None,
        created_at: now_millis(),
    };
    let mut tx = app.store.begin().await.unwrap();
    let stored = tx.insert_desk_if_absent(&candidate).await.unwrap();
    tx.commit().await.unwrap();
    assert_eq!(stored.id, existing.id);
    assert_eq!(stored.capacity, 2);
    assert_eq!(app.store.list_desks(SHOP).await.unwrap().len(), 1);

    let mut tx = app.store.begin().await.unwrap();
    let fresh = Desk {
        id: snowflake_id(),
        name: "U2".into(),
        ..candidate
    };
    assert_eq!(tx.insert_desk_if_absent(&fresh).await.unwrap().id, fresh.id);
    tx.commit().await.unwrap();
    assert_eq!(app.store.list_desks(SHOP).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_desk_admin_validation() {
    let app = setup().await;
    let desks = &app.state.desks;
    let a1 = desks
        .create(
            SHOP,
            DeskCreate {
                name: " A1 ".into(),
                capacity: Some(2),
                area: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(a1.name, "A1");

    let dup = DeskCreate {
        name: "A1".into(),
        capacity: None,
        area: None,
    };
    assert_eq!(code_of(desks.create(SHOP, dup.clone()).await), ErrorCode::TableNameExists);
    // Names are per shop
    assert!(desks.create(OTHER_SHOP, dup).await.is_ok());

    let bad_name = DeskCreate {
        name: "A 1".into(),
        capacity: None,
        area: None,
    };
    assert_eq!(code_of(desks.create(SHOP, bad_name).await), ErrorCode::InvalidTableNumber);

    let zero = DeskCreate {
        name: "A2".into(),
        capacity: Some(0),
        area: None,
    };
    assert_eq!(code_of(desks.create(SHOP, zero).await), ErrorCode::ValidationFailed);

    let a2 = desks
        .create(
            SHOP,
            DeskCreate {
                name: "A2".into(),
                capacity: None,
                area: None,
            },
        )
        .await
        .unwrap();
    let rename = DeskUpdate {
        name: Some("A1".into()),
        ..Default::default()
    };
    assert_eq!(
        code_of(desks.update(SHOP, a2.id, rename).await),
        ErrorCode::TableNameExists
    );

    let updated = desks
        .update(
            SHOP,
            a2.id,
            DeskUpdate {
                capacity: Some(8),
                area: Some("Bar".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.capacity, 8);
    assert_eq!(updated.area.as_deref(), Some("Bar"));
    assert_eq!(updated.name, "A2");
}

#[tokio::test]
async fn test_delete_blocked_by_orders() {
    let app = setup().await;
    let detail = app
        .state
        .orders
        .create(walk_in("D1"), vec![salad_line()])
        .await
        .unwrap();
    let desk_id = detail.order.desk_id.unwrap();

    assert_eq!(
        code_of(app.state.desks.delete(SHOP, desk_id).await),
        ErrorCode::TableHasOrders
    );
    // Settled orders still reference the desk
    app.state.desks.complete_and_pay(SHOP, desk_id).await.unwrap();
    assert_eq!(
        code_of(app.state.desks.delete(SHOP, desk_id).await),
        ErrorCode::TableHasOrders
    );

    let empty = app
        .state
        .desks
        .create(
            SHOP,
            DeskCreate {
                name: "D2".into(),
                capacity: None,
                area: None,
            },
        )
        .await
        .unwrap();
    assert!(app.state.desks.delete(SHOP, empty.id).await.unwrap());
    assert_eq!(
        code_of(app.state.desks.get(SHOP, empty.id).await),
        ErrorCode::TableNotFound
    );
}

#[tokio::test]
async fn test_reset_table_expires_sessions() {
    let app = setup().await;
    let desk = app
        .state
        .desks
        .create(
            SHOP,
            DeskCreate {
                name: "S1".into(),
                capacity: None,
                area: None,
            },
        )
        .await
        .unwrap();
    let session = app.session("S1").await;
    let neighbour = app.session("S2").await;

    assert_eq!(app.state.desks.reset_table(SHOP, desk.id).await.unwrap(), 1);
    assert_eq!(app.state.sessions.get(&session.id).await.unwrap(), None);
    assert!(app.state.sessions.get(&neighbour.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_desks_are_tenant_scoped() {
    let app = setup().await;
    let detail = app
        .state
        .orders
        .create(walk_in("X1"), vec![salad_line()])
        .await
        .unwrap();
    let desk_id = detail.order.desk_id.unwrap();

    assert!(app.state.desks.list_with_status(OTHER_SHOP).await.unwrap().is_empty());
    assert_eq!(
        code_of(app.state.desks.get(OTHER_SHOP, desk_id).await),
        ErrorCode::TableNotFound
    );
    assert_eq!(
        code_of(app.state.desks.complete_and_pay(OTHER_SHOP, desk_id).await),
        ErrorCode::TableNotFound
    );

    // Same table name in the other shop gets its own desk
    let mut foreign = walk_in("X1");
    foreign.shop_id = OTHER_SHOP;
    let other = app
        .state
        .orders
        .create(foreign, vec![salad_line()])
        .await
        .unwrap();
    assert_ne!(other.order.desk_id, Some(desk_id));
    assert_eq!(app.state.desks.get(SHOP, desk_id).await.unwrap().order_count, 1);
}

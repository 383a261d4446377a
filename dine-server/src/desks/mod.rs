//! Desk Occupancy Engine
//!
//! A desk is occupied iff at least one order occupies it (see
//! [`order_occupies_desk`](shared::models::order_occupies_desk)). Orders
//! reference a desk by id, or historically only by a table number equal to
//! the desk name; both links count.
//!
//! The stored `status` column is a staff-controlled flag. It is reported
//! next to the computed `occupancy` and never overrides it.

use shared::error::{AppError, ErrorCode};
use shared::message::DineEvent;
use shared::models::{
    DEFAULT_DESK_CAPACITY, Desk, DeskCreate, DeskRelease, DeskStatus, DeskUpdate, DeskView, Order,
};
use shared::util::{now_millis, snowflake_id};

use crate::db::{DeskRef, DynStore, OrderFilter, StoreError, StoreResult, StoreTx};
use crate::error::ServiceResult;
use crate::message::EventBus;
use crate::sessions::{SessionManager, is_valid_table_number};

#[derive(Clone)]
pub struct DeskService {
    store: DynStore,
    sessions: SessionManager,
    bus: EventBus,
}

impl DeskService {
    pub fn new(store: DynStore, sessions: SessionManager, bus: EventBus) -> Self {
        Self {
            store,
            sessions,
            bus,
        }
    }

    /// Every desk of the shop with its computed occupancy
    pub async fn list_with_status(&self, shop_id: i64) -> ServiceResult<Vec<DeskView>> {
        let desks = self.store.list_desks(shop_id).await?;
        let occupying = self
            .store
            .list_orders(&OrderFilter {
                shop_id,
                occupying_only: true,
                ..Default::default()
            })
            .await?;

        // Orders arrive newest first, so each desk's first match is its current order
        Ok(desks
            .into_iter()
            .map(|desk| {
                let matching: Vec<&Order> = occupying
                    .iter()
                    .filter(|o| o.references_desk(desk.id, &desk.name))
                    .collect();
                let current_order = matching.first().map(|o| (*o).clone());
                view(desk, matching.len() as i64, current_order)
            })
            .collect())
    }

    /// A single desk with its computed occupancy
    pub async fn get(&self, shop_id: i64, desk_id: i64) -> ServiceResult<DeskView> {
        let desk = self.require(shop_id, desk_id).await?;
        let filter = OrderFilter::occupying(shop_id, DeskRef::of(&desk));
        let order_count = self.store.count_orders(&filter).await?;
        let current_order = if order_count > 0 {
            self.store.list_orders(&filter).await?.into_iter().next()
        } else {
            None
        };
        Ok(view(desk, order_count, current_order))
    }

    /// Staff override of the stored flag; orders are not touched
    pub async fn toggle_status(
        &self,
        shop_id: i64,
        desk_id: i64,
        status: DeskStatus,
    ) -> ServiceResult<DeskView> {
        if !self.store.set_desk_status(shop_id, desk_id, status).await? {
            return Err(table_not_found(desk_id).into());
        }
        tracing::info!(shop_id, desk_id, %status, "Desk status overridden");
        self.bus
            .publish(DineEvent::desk_status_changed(shop_id, desk_id, status));
        self.get(shop_id, desk_id).await
    }

    /// Settle every order occupying the desk (completed + paid) and mark the
    /// desk available, all in one transaction
    pub async fn complete_and_pay(
        &self,
        shop_id: i64,
        desk_id: i64,
    ) -> ServiceResult<DeskRelease> {
        let mut tx = self.store.begin().await?;
        let desk = tx
            .get_desk(shop_id, desk_id)
            .await?
            .ok_or_else(|| table_not_found(desk_id))?;

        let orders = tx
            .settle_desk_orders(shop_id, &DeskRef::of(&desk), now_millis())
            .await?;
        tx.set_desk_status(shop_id, desk_id, DeskStatus::Available)
            .await?;
        tx.commit().await?;

        let order_ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        tracing::info!(shop_id, desk_id, settled = order_ids.len(), "Desk released");
        self.bus.publish(DineEvent::desk_released(&desk, &order_ids));

        Ok(DeskRelease { desk_id, orders })
    }

    pub async fn create(&self, shop_id: i64, req: DeskCreate) -> ServiceResult<Desk> {
        let name = req.name.trim().to_string();
        if !is_valid_table_number(&name) {
            return Err(AppError::with_message(
                ErrorCode::InvalidTableNumber,
                format!("invalid table number '{name}'"),
            )
            .into());
        }
        let capacity = req.capacity.unwrap_or(DEFAULT_DESK_CAPACITY);
        if capacity < 1 {
            return Err(AppError::validation("capacity must be positive").into());
        }

        let desk = Desk {
            id: snowflake_id(),
            shop_id,
            name,
            capacity,
            status: DeskStatus::Available,
            area: req.area,
            created_at: now_millis(),
        };
        match self.store.insert_desk(&desk).await {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => return Err(name_taken(&desk.name).into()),
            Err(e) => return Err(e.into()),
        }
        tracing::info!(shop_id, desk_id = desk.id, name = %desk.name, "Desk created");
        Ok(desk)
    }

    pub async fn update(
        &self,
        shop_id: i64,
        desk_id: i64,
        patch: DeskUpdate,
    ) -> ServiceResult<Desk> {
        let mut desk = self.require(shop_id, desk_id).await?;
        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if !is_valid_table_number(&name) {
                return Err(AppError::with_message(
                    ErrorCode::InvalidTableNumber,
                    format!("invalid table number '{name}'"),
                )
                .into());
            }
            desk.name = name;
        }
        if let Some(capacity) = patch.capacity {
            if capacity < 1 {
                return Err(AppError::validation("capacity must be positive").into());
            }
            desk.capacity = capacity;
        }
        if patch.area.is_some() {
            desk.area = patch.area;
        }

        match self.store.update_desk(&desk).await {
            Ok(true) => Ok(desk),
            Ok(false) => Err(table_not_found(desk_id).into()),
            Err(StoreError::Duplicate(_)) => Err(name_taken(&desk.name).into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Refused while any order, settled or not, still references the desk
    pub async fn delete(&self, shop_id: i64, desk_id: i64) -> ServiceResult<bool> {
        let desk = self.require(shop_id, desk_id).await?;
        let referencing = self
            .store
            .count_orders(&OrderFilter {
                shop_id,
                desk: Some(DeskRef::of(&desk)),
                ..Default::default()
            })
            .await?;
        if referencing > 0 {
            return Err(AppError::new(ErrorCode::TableHasOrders)
                .with_detail("desk_id", desk_id)
                .with_detail("orders", referencing)
                .into());
        }
        let deleted = self.store.delete_desk(shop_id, desk_id).await?;
        tracing::info!(shop_id, desk_id, "Desk deleted");
        Ok(deleted)
    }

    /// Expire every active session of the desk's table
    pub async fn reset_table(&self, shop_id: i64, desk_id: i64) -> ServiceResult<u64> {
        let desk = self.require(shop_id, desk_id).await?;
        self.sessions
            .reset_table_sessions(&desk.name, shop_id)
            .await
    }

    async fn require(&self, shop_id: i64, desk_id: i64) -> ServiceResult<Desk> {
        self.store
            .get_desk(shop_id, desk_id)
            .await?
            .ok_or_else(|| table_not_found(desk_id).into())
    }
}

/// Find the desk named after `table_number`, provisioning one when the shop
/// has none yet
pub async fn resolve_or_create(
    tx: &mut dyn StoreTx,
    shop_id: i64,
    table_number: &str,
) -> StoreResult<Desk> {
    if let Some(desk) = tx.find_desk_by_name(shop_id, table_number).await? {
        return Ok(desk);
    }
    let desk = Desk {
        id: snowflake_id(),
        shop_id,
        name: table_number.to_string(),
        capacity: DEFAULT_DESK_CAPACITY,
        status: DeskStatus::Available,
        area: None,
        created_at: now_millis(),
    };
    let stored = tx.insert_desk_if_absent(&desk).await?;
    if stored.id == desk.id {
        tracing::info!(
            shop_id,
            desk_id = desk.id,
            table = table_number,
            "Desk provisioned for order"
        );
    } else {
        tracing::debug!(
            shop_id,
            desk_id = stored.id,
            table = table_number,
            "Desk provisioned concurrently, reusing it"
        );
    }
    Ok(stored)
}

fn view(desk: Desk, order_count: i64, current_order: Option<Order>) -> DeskView {
    let occupancy = if order_count > 0 {
        DeskStatus::Occupied
    } else {
        DeskStatus::Available
    };
    DeskView {
        desk,
        order_count,
        current_order,
        occupancy,
    }
}

fn table_not_found(desk_id: i64) -> AppError {
    AppError::new(ErrorCode::TableNotFound).with_detail("desk_id", desk_id)
}

fn name_taken(name: &str) -> AppError {
    AppError::new(ErrorCode::TableNameExists).with_detail("name", name)
}

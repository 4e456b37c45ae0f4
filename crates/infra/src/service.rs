//! Marketplace application service.
//!
//! Every operation follows the same pipeline:
//!
//! ```text
//! Identity + request
//!   ↓
//! 1. Authorize (role / ownership)
//!   ↓
//! 2. Lock the lot (operations touching a ledger)
//!   ↓
//! 3. Load aggregates from the store
//!   ↓
//! 4. Handle + apply commands in memory (pure; a rejection changes nothing)
//!   ↓
//! 5. Persist: ledger first (compare-and-swap), then lot/order
//!   ↓
//! 6. On a failed later write, write the previous ledger back
//! ```
//!
//! The caller's identity is always an explicit argument; nothing here reads
//! session state.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use farmlink_auth::{
    AuthzError, Identity, Role, require_owner, require_owner_or_party, require_role,
};
use farmlink_core::{
    Aggregate, AggregateId, AggregateRoot, DomainError, ExpectedVersion, Unit,
};
use farmlink_events::Event;
use farmlink_inventory::{
    AdjustTotal, Commit, LedgerCommand, LedgerEntry, OpenLedger, Release, Reserve,
};
use farmlink_products::{
    CreateLot, DrawDownStock, LotCommand, LotId, LotPatch, PriceQuote, PriceTier, ProduceLot,
    RemoveLot, UpdateLot,
};
use farmlink_sales::{
    AcceptOrder, CancelOrder, FulfillOrder, Order, OrderCommand, OrderId, PlaceOrder,
    ReschedulePickup,
};

use crate::config::MarketplaceConfig;
use crate::locks::LotLocks;
use crate::store::{MarketplaceStore, StoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Unauthorized(#[from] AuthzError),

    /// A concurrent writer changed the record first; reload and retry.
    #[error("conflicting concurrent update: {0}")]
    Conflict(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Concurrency(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Store(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Input for listing a new lot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLot {
    pub name: String,
    pub unit: Unit,
    pub available_quantity: Decimal,
    /// Candidate tiers in any order.
    pub tiers: Vec<PriceTier>,
}

/// Input for placing an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub quantity: Decimal,
    pub pickup_date: NaiveDate,
    pub pickup_location: String,
}

/// Application layer over a [`MarketplaceStore`].
#[derive(Debug)]
pub struct MarketplaceService<S> {
    store: S,
    locks: LotLocks,
    config: MarketplaceConfig,
}

impl<S> MarketplaceService<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, MarketplaceConfig::default())
    }

    pub fn with_config(store: S, config: MarketplaceConfig) -> Self {
        Self {
            store,
            locks: LotLocks::new(),
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &MarketplaceConfig {
        &self.config
    }
}

impl<S> MarketplaceService<S>
where
    S: MarketplaceStore,
{
    // ---------------------------------------------------------------------
    // Lots
    // ---------------------------------------------------------------------

    #[instrument(skip(self, identity, new_lot), fields(user_id = %identity.user_id), err(level = "warn"))]
    pub fn create_lot(&self, identity: &Identity, new_lot: NewLot) -> ServiceResult<ProduceLot> {
        require_role(identity, Role::Farmer)?;
        self.ensure_tier_limit(&new_lot.tiers)?;

        let lot_id = LotId::new(AggregateId::new());
        let now = Utc::now();

        let mut lot = ProduceLot::empty(lot_id);
        let events = lot.execute(&LotCommand::CreateLot(CreateLot {
            lot_id,
            owner_id: identity.user_id,
            name: new_lot.name,
            unit: new_lot.unit,
            available_quantity: new_lot.available_quantity,
            tiers: new_lot.tiers,
            occurred_at: now,
        }))?;
        log_events(&events);

        let mut ledger = LedgerEntry::empty(lot_id);
        ledger.execute(&LedgerCommand::OpenLedger(OpenLedger {
            lot_id,
            total: lot.available_quantity(),
            occurred_at: now,
        }))?;

        let _guard = self.locks.lock(lot_id);
        self.store.save_ledger(&ledger, ExpectedVersion::Exact(0))?;
        if let Err(err) = self.store.save_lot(&lot) {
            warn!(lot_id = %lot_id, error = %err, "saving new lot failed; dropping its ledger");
            if let Err(cleanup) = self.store.delete_ledger(lot_id) {
                error!(lot_id = %lot_id, error = %cleanup, "orphaned ledger left behind");
            }
            return Err(err.into());
        }

        info!(lot_id = %lot_id, name = lot.name(), total = %lot.available_quantity(), "lot created");
        Ok(lot)
    }

    #[instrument(skip(self, identity, patch), fields(user_id = %identity.user_id, lot_id = %lot_id), err(level = "warn"))]
    pub fn update_lot(
        &self,
        identity: &Identity,
        lot_id: LotId,
        patch: LotPatch,
    ) -> ServiceResult<ProduceLot> {
        require_role(identity, Role::Farmer)?;
        if let Some(tiers) = &patch.tiers {
            self.ensure_tier_limit(tiers)?;
        }

        let _guard = self.locks.lock(lot_id);
        let mut lot = self.live_lot(lot_id)?;
        require_owner(identity, lot.owner()?)?;

        let open_orders = self.open_order_count(lot_id)?;
        let now = Utc::now();
        let events = lot.execute(&LotCommand::UpdateLot(UpdateLot {
            lot_id,
            patch,
            open_orders,
            occurred_at: now,
        }))?;
        log_events(&events);

        let previous = self.ledger_for(lot_id)?;
        let mut ledger = previous.clone();
        if ledger.total() != lot.available_quantity() {
            ledger.execute(&LedgerCommand::AdjustTotal(AdjustTotal {
                lot_id,
                total: lot.available_quantity(),
                occurred_at: now,
            }))?;
            self.store
                .save_ledger(&ledger, ExpectedVersion::Exact(previous.version()))?;
        }

        if let Err(err) = self.store.save_lot(&lot) {
            self.restore_ledger(&previous, &ledger);
            return Err(err.into());
        }

        info!(lot_id = %lot_id, version = lot.version(), "lot updated");
        Ok(lot)
    }

    #[instrument(skip(self, identity), fields(user_id = %identity.user_id, lot_id = %lot_id), err(level = "warn"))]
    pub fn delete_lot(&self, identity: &Identity, lot_id: LotId) -> ServiceResult<()> {
        require_role(identity, Role::Farmer)?;

        let guard = self.locks.lock(lot_id);
        let mut lot = self.live_lot(lot_id)?;
        require_owner(identity, lot.owner()?)?;

        let open_orders = self.open_order_count(lot_id)?;
        let events = lot.execute(&LotCommand::RemoveLot(RemoveLot {
            lot_id,
            open_orders,
            occurred_at: Utc::now(),
        }))?;
        log_events(&events);

        // Ledger goes first; a failed lot delete puts it back so a retry
        // still finds both.
        let ledger = self.store.load_ledger(lot_id)?;
        self.store.delete_ledger(lot_id)?;
        if let Err(err) = self.store.delete_lot(lot_id) {
            if let Some(previous) = &ledger {
                self.recreate_ledger(previous);
            }
            return Err(err.into());
        }
        drop(guard);
        self.locks.forget(lot_id);

        info!(lot_id = %lot_id, "lot deleted");
        Ok(())
    }

    pub fn get_lot(&self, identity: &Identity, lot_id: LotId) -> ServiceResult<ProduceLot> {
        debug!(user_id = %identity.user_id, lot_id = %lot_id, "get lot");
        self.live_lot(lot_id)
    }

    /// Every live lot, oldest first.
    pub fn list_lots(&self, identity: &Identity) -> ServiceResult<Vec<ProduceLot>> {
        debug!(user_id = %identity.user_id, "list lots");
        let lots = self.store.list_lots()?;
        Ok(lots.into_iter().filter(ProduceLot::is_live).collect())
    }

    /// The caller's own lots.
    pub fn list_farmer_lots(&self, identity: &Identity) -> ServiceResult<Vec<ProduceLot>> {
        require_role(identity, Role::Farmer)?;
        let lots = self.store.list_lots_by_owner(identity.user_id)?;
        Ok(lots.into_iter().filter(ProduceLot::is_live).collect())
    }

    /// Preview the tier and total for `quantity` without reserving anything.
    pub fn quote(
        &self,
        identity: &Identity,
        lot_id: LotId,
        quantity: Decimal,
    ) -> ServiceResult<PriceQuote> {
        debug!(user_id = %identity.user_id, lot_id = %lot_id, %quantity, "quote");
        let lot = self.live_lot(lot_id)?;
        let quantity = lot.quantity_of(quantity)?;
        Ok(lot.price_schedule()?.quote(&quantity)?)
    }

    /// Current reservation state of a lot.
    pub fn ledger(&self, identity: &Identity, lot_id: LotId) -> ServiceResult<LedgerEntry> {
        debug!(user_id = %identity.user_id, lot_id = %lot_id, "get ledger");
        self.ledger_for(lot_id)
    }

    // ---------------------------------------------------------------------
    // Orders
    // ---------------------------------------------------------------------

    /// Price the order, reserve its quantity and store it, as one step.
    ///
    /// Either the order is stored and its quantity reserved, or neither.
    #[instrument(
        skip(self, identity, request),
        fields(user_id = %identity.user_id, lot_id = %lot_id, quantity = %request.quantity),
        err(level = "warn")
    )]
    pub fn place_order(
        &self,
        identity: &Identity,
        lot_id: LotId,
        request: OrderRequest,
    ) -> ServiceResult<Order> {
        require_role(identity, Role::Restaurant)?;

        let _guard = self.locks.lock(lot_id);
        let lot = self.live_lot(lot_id)?;

        let order_id = OrderId::new(AggregateId::new());
        let now = Utc::now();
        let mut order = Order::empty(order_id);
        let events = order.execute(&OrderCommand::PlaceOrder(PlaceOrder::against(
            &lot,
            order_id,
            identity.user_id,
            request.quantity,
            request.pickup_date,
            request.pickup_location,
            now,
        )?))?;
        log_events(&events);

        let previous = self.ledger_for(lot_id)?;
        let mut ledger = previous.clone();
        ledger.execute(&LedgerCommand::Reserve(Reserve {
            lot_id,
            quantity: order.requested_quantity(),
            occurred_at: now,
        }))?;

        self.store
            .save_ledger(&ledger, ExpectedVersion::Exact(previous.version()))?;
        if let Err(err) = self.store.save_order(&order) {
            self.restore_ledger(&previous, &ledger);
            return Err(err.into());
        }

        info!(
            order_id = %order_id,
            total = %order.total_price(),
            available = %ledger.available(),
            "order placed"
        );
        Ok(order)
    }

    #[instrument(skip(self, identity), fields(user_id = %identity.user_id, order_id = %order_id), err(level = "warn"))]
    pub fn accept_order(&self, identity: &Identity, order_id: OrderId) -> ServiceResult<Order> {
        require_role(identity, Role::Farmer)?;

        self.with_order_locked(order_id, |order| {
            let (_, _, farmer) = order.parties()?;
            require_owner(identity, farmer)?;

            let events = order.execute(&OrderCommand::AcceptOrder(AcceptOrder {
                order_id,
                occurred_at: Utc::now(),
            }))?;
            log_events(&events);

            self.store.save_order(order)?;
            info!(order_id = %order_id, "order accepted");
            Ok(())
        })
    }

    /// Mark an accepted order picked up: commits its reservation and draws
    /// down the lot's stock.
    #[instrument(skip(self, identity), fields(user_id = %identity.user_id, order_id = %order_id), err(level = "warn"))]
    pub fn fulfill_order(&self, identity: &Identity, order_id: OrderId) -> ServiceResult<Order> {
        require_role(identity, Role::Farmer)?;

        self.with_order_locked(order_id, |order| {
            let (lot_id, _, farmer) = order.parties()?;
            require_owner(identity, farmer)?;

            let now = Utc::now();
            let events = order.execute(&OrderCommand::FulfillOrder(FulfillOrder {
                order_id,
                occurred_at: now,
            }))?;
            log_events(&events);
            let quantity = order.requested_quantity();

            let previous_ledger = self.ledger_for(lot_id)?;
            let mut ledger = previous_ledger.clone();
            ledger.execute(&LedgerCommand::Commit(Commit {
                lot_id,
                quantity,
                occurred_at: now,
            }))?;

            let previous_lot = self.live_lot(lot_id)?;
            let mut lot = previous_lot.clone();
            lot.execute(&LotCommand::DrawDownStock(DrawDownStock {
                lot_id,
                quantity,
                occurred_at: now,
            }))?;

            self.store
                .save_ledger(&ledger, ExpectedVersion::Exact(previous_ledger.version()))?;
            if let Err(err) = self.store.save_lot(&lot) {
                self.restore_ledger(&previous_ledger, &ledger);
                return Err(err.into());
            }
            if let Err(err) = self.store.save_order(order) {
                self.restore_ledger(&previous_ledger, &ledger);
                self.restore_lot(&previous_lot);
                return Err(err.into());
            }

            info!(order_id = %order_id, committed = %quantity, remaining = %lot.available_quantity(), "order fulfilled");
            Ok(())
        })
    }

    /// Cancel an open order and release its reservation.
    ///
    /// Allowed for the buyer and for the farmer who owns the lot.
    #[instrument(skip(self, identity), fields(user_id = %identity.user_id, order_id = %order_id), err(level = "warn"))]
    pub fn cancel_order(&self, identity: &Identity, order_id: OrderId) -> ServiceResult<Order> {
        self.with_order_locked(order_id, |order| {
            let (lot_id, buyer, farmer) = order.parties()?;
            require_owner_or_party(identity, farmer, buyer)?;

            let now = Utc::now();
            let events = order.execute(&OrderCommand::CancelOrder(CancelOrder {
                order_id,
                cancelled_by: identity.user_id,
                occurred_at: now,
            }))?;
            log_events(&events);

            let previous = self.ledger_for(lot_id)?;
            let mut ledger = previous.clone();
            ledger.execute(&LedgerCommand::Release(Release {
                lot_id,
                quantity: order.requested_quantity(),
                occurred_at: now,
            }))?;

            self.store
                .save_ledger(&ledger, ExpectedVersion::Exact(previous.version()))?;
            if let Err(err) = self.store.save_order(order) {
                self.restore_ledger(&previous, &ledger);
                return Err(err.into());
            }

            info!(order_id = %order_id, cancelled_by = %identity.user_id, "order cancelled");
            Ok(())
        })
    }

    #[instrument(skip(self, identity, pickup_location), fields(user_id = %identity.user_id, order_id = %order_id), err(level = "warn"))]
    pub fn reschedule_pickup(
        &self,
        identity: &Identity,
        order_id: OrderId,
        pickup_date: NaiveDate,
        pickup_location: String,
    ) -> ServiceResult<Order> {
        require_role(identity, Role::Restaurant)?;

        self.with_order_locked(order_id, |order| {
            let (_, buyer, _) = order.parties()?;
            require_owner(identity, buyer)?;

            let events = order.execute(&OrderCommand::ReschedulePickup(ReschedulePickup {
                order_id,
                pickup_date,
                pickup_location,
                occurred_at: Utc::now(),
            }))?;
            log_events(&events);

            self.store.save_order(order)?;
            info!(order_id = %order_id, %pickup_date, "pickup rescheduled");
            Ok(())
        })
    }

    /// An order, visible to its buyer and to the lot's farmer.
    pub fn get_order(&self, identity: &Identity, order_id: OrderId) -> ServiceResult<Order> {
        let order = self.order(order_id)?;
        let (_, buyer, farmer) = order.parties()?;
        require_owner_or_party(identity, farmer, buyer)?;
        Ok(order)
    }

    /// Orders against the caller's lots, newest first.
    pub fn list_farmer_orders(&self, identity: &Identity) -> ServiceResult<Vec<Order>> {
        require_role(identity, Role::Farmer)?;
        Ok(self.store.list_orders_for_farmer(identity.user_id)?)
    }

    /// Orders the caller placed, newest first.
    pub fn list_buyer_orders(&self, identity: &Identity) -> ServiceResult<Vec<Order>> {
        require_role(identity, Role::Restaurant)?;
        Ok(self.store.list_orders_for_buyer(identity.user_id)?)
    }

    // ---------------------------------------------------------------------
    // helpers
    // ---------------------------------------------------------------------

    fn ensure_tier_limit(&self, tiers: &[PriceTier]) -> ServiceResult<()> {
        if tiers.len() > self.config.max_price_tiers {
            return Err(DomainError::invalid_schedule(format!(
                "a schedule may have at most {} tiers (got {})",
                self.config.max_price_tiers,
                tiers.len()
            ))
            .into());
        }
        Ok(())
    }

    fn live_lot(&self, lot_id: LotId) -> ServiceResult<ProduceLot> {
        match self.store.load_lot(lot_id)? {
            Some(lot) if lot.is_live() => Ok(lot),
            _ => Err(DomainError::not_found().into()),
        }
    }

    fn order(&self, order_id: OrderId) -> ServiceResult<Order> {
        match self.store.load_order(order_id)? {
            Some(order) if order.is_placed() => Ok(order),
            _ => Err(DomainError::not_found().into()),
        }
    }

    fn ledger_for(&self, lot_id: LotId) -> ServiceResult<LedgerEntry> {
        match self.store.load_ledger(lot_id)? {
            Some(entry) if entry.is_open() => Ok(entry),
            _ => Err(DomainError::not_found().into()),
        }
    }

    fn open_order_count(&self, lot_id: LotId) -> ServiceResult<usize> {
        let orders = self.store.load_orders_for_lot(lot_id)?;
        Ok(orders.iter().filter(|o| o.is_open()).count())
    }

    /// Run `f` on a freshly loaded order while its lot is locked.
    ///
    /// The order is re-read after the lock is taken so `f` never acts on a
    /// status another caller has already moved on from.
    fn with_order_locked(
        &self,
        order_id: OrderId,
        f: impl FnOnce(&mut Order) -> ServiceResult<()>,
    ) -> ServiceResult<Order> {
        let (lot_id, _, _) = self.order(order_id)?.parties()?;
        let _guard = self.locks.lock(lot_id);

        let mut order = self.order(order_id)?;
        f(&mut order)?;
        Ok(order)
    }

    /// Undo a ledger write whose follow-up write failed.
    fn restore_ledger(&self, previous: &LedgerEntry, written: &LedgerEntry) {
        if previous.version() == written.version() {
            return;
        }
        let lot_id = previous.lot_id();
        match self
            .store
            .save_ledger(previous, ExpectedVersion::Exact(written.version()))
        {
            Ok(()) => warn!(lot_id = %lot_id, version = previous.version(), "ledger write rolled back"),
            Err(err) => error!(lot_id = %lot_id, error = %err, "ledger rollback failed"),
        }
    }

    /// Put back a ledger that was deleted ahead of a failed lot delete.
    fn recreate_ledger(&self, previous: &LedgerEntry) {
        let lot_id = previous.lot_id();
        match self.store.save_ledger(previous, ExpectedVersion::Exact(0)) {
            Ok(()) => warn!(lot_id = %lot_id, "ledger delete rolled back"),
            Err(err) => error!(lot_id = %lot_id, error = %err, "ledger rollback failed"),
        }
    }

    fn restore_lot(&self, previous: &ProduceLot) {
        let lot_id = previous.id_typed();
        match self.store.save_lot(previous) {
            Ok(()) => warn!(lot_id = %lot_id, "lot write rolled back"),
            Err(err) => error!(lot_id = %lot_id, error = %err, "lot rollback failed"),
        }
    }
}

fn log_events<E: Event>(events: &[E]) {
    for event in events {
        debug!(event_type = event.event_type(), occurred_at = %event.occurred_at(), "event applied");
    }
}

use std::sync::Arc;

use thiserror::Error;

use farmlink_core::{ExpectedVersion, UserId};
use farmlink_inventory::LedgerEntry;
use farmlink_products::{LotId, ProduceLot};
use farmlink_sales::{Order, OrderId};

/// Storage operation error.
///
/// These are **infrastructure errors** (backend failures, stale writes) as
/// opposed to domain errors (validation, invariants).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A versioned write found a different stored version.
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    /// The backend could not complete the operation.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persistence boundary for lots, orders and ledger entries.
///
/// Stores hold the current state of each aggregate. Reads of absent records
/// return `Ok(None)` (or an empty list), never an error.
///
/// ## Ordering
///
/// - lot listings are returned oldest first
/// - order listings are returned newest first
///
/// ## Concurrency
///
/// `save_ledger` is a compare-and-swap on the entry version: the write only
/// lands if the stored entry is at `expected_version` (0 = absent). Lots and
/// orders are written last-writer-wins; the service serialises writers per lot.
pub trait MarketplaceStore: Send + Sync {
    fn load_lot(&self, lot_id: LotId) -> Result<Option<ProduceLot>, StoreError>;

    fn save_lot(&self, lot: &ProduceLot) -> Result<(), StoreError>;

    fn delete_lot(&self, lot_id: LotId) -> Result<(), StoreError>;

    fn list_lots(&self) -> Result<Vec<ProduceLot>, StoreError>;

    fn list_lots_by_owner(&self, owner_id: UserId) -> Result<Vec<ProduceLot>, StoreError>;

    fn load_order(&self, order_id: OrderId) -> Result<Option<Order>, StoreError>;

    fn save_order(&self, order: &Order) -> Result<(), StoreError>;

    /// All orders referencing `lot_id`, whatever their status.
    fn load_orders_for_lot(&self, lot_id: LotId) -> Result<Vec<Order>, StoreError>;

    fn list_orders_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>, StoreError>;

    fn list_orders_for_farmer(&self, farmer_id: UserId) -> Result<Vec<Order>, StoreError>;

    fn load_ledger(&self, lot_id: LotId) -> Result<Option<LedgerEntry>, StoreError>;

    /// Persist `entry` if the stored version still equals `expected_version`.
    fn save_ledger(
        &self,
        entry: &LedgerEntry,
        expected_version: ExpectedVersion,
    ) -> Result<(), StoreError>;

    fn delete_ledger(&self, lot_id: LotId) -> Result<(), StoreError>;
}

impl<S> MarketplaceStore for Arc<S>
where
    S: MarketplaceStore + ?Sized,
{
    fn load_lot(&self, lot_id: LotId) -> Result<Option<ProduceLot>, StoreError> {
        (**self).load_lot(lot_id)
    }

    fn save_lot(&self, lot: &ProduceLot) -> Result<(), StoreError> {
        (**self).save_lot(lot)
    }

    fn delete_lot(&self, lot_id: LotId) -> Result<(), StoreError> {
        (**self).delete_lot(lot_id)
    }

    fn list_lots(&self) -> Result<Vec<ProduceLot>, StoreError> {
        (**self).list_lots()
    }

    fn list_lots_by_owner(&self, owner_id: UserId) -> Result<Vec<ProduceLot>, StoreError> {
        (**self).list_lots_by_owner(owner_id)
    }

    fn load_order(&self, order_id: OrderId) -> Result<Option<Order>, StoreError> {
        (**self).load_order(order_id)
    }

    fn save_order(&self, order: &Order) -> Result<(), StoreError> {
        (**self).save_order(order)
    }

    fn load_orders_for_lot(&self, lot_id: LotId) -> Result<Vec<Order>, StoreError> {
        (**self).load_orders_for_lot(lot_id)
    }

    fn list_orders_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>, StoreError> {
        (**self).list_orders_for_buyer(buyer_id)
    }

    fn list_orders_for_farmer(&self, farmer_id: UserId) -> Result<Vec<Order>, StoreError> {
        (**self).list_orders_for_farmer(farmer_id)
    }

    fn load_ledger(&self, lot_id: LotId) -> Result<Option<LedgerEntry>, StoreError> {
        (**self).load_ledger(lot_id)
    }

    fn save_ledger(
        &self,
        entry: &LedgerEntry,
        expected_version: ExpectedVersion,
    ) -> Result<(), StoreError> {
        (**self).save_ledger(entry, expected_version)
    }

    fn delete_ledger(&self, lot_id: LotId) -> Result<(), StoreError> {
        (**self).delete_ledger(lot_id)
    }
}

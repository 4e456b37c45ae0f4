use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::RwLock;

use farmlink_core::{AggregateRoot, ExpectedVersion, UserId};
use farmlink_inventory::LedgerEntry;
use farmlink_products::{LotId, ProduceLot};
use farmlink_sales::{Order, OrderId};

use super::r#trait::{MarketplaceStore, StoreError};

/// In-memory marketplace store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryMarketplaceStore {
    lots: RwLock<HashMap<LotId, ProduceLot>>,
    orders: RwLock<HashMap<OrderId, Order>>,
    ledgers: RwLock<HashMap<LotId, LedgerEntry>>,
}

impl InMemoryMarketplaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Backend("lock poisoned".to_string())
    }

    fn orders_where(&self, pred: impl Fn(&Order) -> bool) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.read().map_err(|_| Self::poisoned())?;
        let mut matched: Vec<Order> = orders.values().filter(|o| pred(o)).cloned().collect();
        newest_first(&mut matched);
        Ok(matched)
    }

    fn lots_where(&self, pred: impl Fn(&ProduceLot) -> bool) -> Result<Vec<ProduceLot>, StoreError> {
        let lots = self.lots.read().map_err(|_| Self::poisoned())?;
        let mut matched: Vec<ProduceLot> = lots.values().filter(|l| pred(l)).cloned().collect();
        matched.sort_by_key(|l| (l.created_at(), l.id_typed()));
        Ok(matched)
    }
}

fn newest_first(orders: &mut [Order]) {
    orders.sort_by_key(|o| Reverse((o.created_at(), o.id_typed())));
}

impl MarketplaceStore for InMemoryMarketplaceStore {
    fn load_lot(&self, lot_id: LotId) -> Result<Option<ProduceLot>, StoreError> {
        let lots = self.lots.read().map_err(|_| Self::poisoned())?;
        Ok(lots.get(&lot_id).cloned())
    }

    fn save_lot(&self, lot: &ProduceLot) -> Result<(), StoreError> {
        let mut lots = self.lots.write().map_err(|_| Self::poisoned())?;
        lots.insert(lot.id_typed(), lot.clone());
        Ok(())
    }

    fn delete_lot(&self, lot_id: LotId) -> Result<(), StoreError> {
        let mut lots = self.lots.write().map_err(|_| Self::poisoned())?;
        lots.remove(&lot_id);
        Ok(())
    }

    fn list_lots(&self) -> Result<Vec<ProduceLot>, StoreError> {
        self.lots_where(|_| true)
    }

    fn list_lots_by_owner(&self, owner_id: UserId) -> Result<Vec<ProduceLot>, StoreError> {
        self.lots_where(|l| l.owner_id() == Some(owner_id))
    }

    fn load_order(&self, order_id: OrderId) -> Result<Option<Order>, StoreError> {
        let orders = self.orders.read().map_err(|_| Self::poisoned())?;
        Ok(orders.get(&order_id).cloned())
    }

    fn save_order(&self, order: &Order) -> Result<(), StoreError> {
        let mut orders = self.orders.write().map_err(|_| Self::poisoned())?;
        orders.insert(order.id_typed(), order.clone());
        Ok(())
    }

    fn load_orders_for_lot(&self, lot_id: LotId) -> Result<Vec<Order>, StoreError> {
        self.orders_where(|o| o.lot_id() == Some(lot_id))
    }

    fn list_orders_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>, StoreError> {
        self.orders_where(|o| o.buyer_id() == Some(buyer_id))
    }

    fn list_orders_for_farmer(&self, farmer_id: UserId) -> Result<Vec<Order>, StoreError> {
        self.orders_where(|o| o.farmer_id() == Some(farmer_id))
    }

    fn load_ledger(&self, lot_id: LotId) -> Result<Option<LedgerEntry>, StoreError> {
        let ledgers = self.ledgers.read().map_err(|_| Self::poisoned())?;
        Ok(ledgers.get(&lot_id).cloned())
    }

    fn save_ledger(
        &self,
        entry: &LedgerEntry,
        expected_version: ExpectedVersion,
    ) -> Result<(), StoreError> {
        let mut ledgers = self.ledgers.write().map_err(|_| Self::poisoned())?;

        let current = ledgers.get(&entry.lot_id()).map(|e| e.version()).unwrap_or(0);
        if !expected_version.matches(current) {
            return Err(StoreError::Concurrency(format!(
                "ledger for lot {}: expected {expected_version:?}, found {current}",
                entry.lot_id()
            )));
        }

        ledgers.insert(entry.lot_id(), entry.clone());
        Ok(())
    }

    fn delete_ledger(&self, lot_id: LotId) -> Result<(), StoreError> {
        let mut ledgers = self.ledgers.write().map_err(|_| Self::poisoned())?;
        ledgers.remove(&lot_id);
        Ok(())
    }
}

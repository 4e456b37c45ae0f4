//! Per-lot mutual exclusion for the service layer.
//!
//! Every operation that reads and then writes a lot's ledger holds that lot's
//! lock for the whole read-check-write, so two placements against the same lot
//! can never both observe the same `available` quantity. Operations on
//! different lots do not contend.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};

use farmlink_products::LotId;

/// Held while a lot is being mutated; released on drop.
pub type LotGuard = ArcMutexGuard<RawMutex, ()>;

#[derive(Debug, Default)]
pub struct LotLocks {
    locks: Mutex<HashMap<LotId, Arc<Mutex<()>>>>,
}

impl LotLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the lock for `lot_id` is held.
    pub fn lock(&self, lot_id: LotId) -> LotGuard {
        let slot = {
            let mut locks = self.locks.lock();
            Arc::clone(locks.entry(lot_id).or_default())
        };
        slot.lock_arc()
    }

    /// Drop the lock slot of a deleted lot.
    ///
    /// Callers still holding its guard keep it; later callers get a fresh slot.
    pub fn forget(&self, lot_id: LotId) {
        self.locks.lock().remove(&lot_id);
    }

    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

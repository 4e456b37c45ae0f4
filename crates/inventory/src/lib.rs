//! Inventory ledger domain module.
//!
//! Tracks, per produce lot, how much stock is reserved by open orders and how
//! much is still orderable. Pure domain logic: atomicity across concurrent
//! callers is provided by the infrastructure layer that drives it.

pub mod ledger;

pub use ledger::{
    AdjustTotal, Commit, LedgerCommand, LedgerEntry, LedgerEvent, LedgerOpened, OpenLedger,
    QuantityReserved, Release, Reserve, ReservationCommitted, ReservationReleased, TotalAdjusted,
};

//! Produce lots and their tiered price schedules.
//!
//! This crate contains the business rules for listing produce, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod lot;
pub mod schedule;

pub use lot::{
    CreateLot, DrawDownStock, LotCommand, LotCreated, LotEvent, LotId, LotPatch, LotRemoved,
    LotUpdated, ProduceLot, RemoveLot, StockDrawnDown, UpdateLot,
};
pub use schedule::{PriceQuote, PriceSchedule, PriceTier};

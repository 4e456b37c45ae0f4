//! Orders placed by restaurants against produce lots.
//!
//! This crate contains the order lifecycle rules, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod order;

pub use order::{
    AcceptOrder, CancelOrder, FulfillOrder, Order, OrderAccepted, OrderCancelled, OrderCommand,
    OrderEvent, OrderFulfilled, OrderId, OrderPlaced, OrderStatus, PickupRescheduled, PlaceOrder,
    ReschedulePickup,
};

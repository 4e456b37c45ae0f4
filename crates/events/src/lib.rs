//! Domain events emitted by the marketplace aggregates.

pub mod event;

pub use event::Event;

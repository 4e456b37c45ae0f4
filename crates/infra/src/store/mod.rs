//! Storage boundary for the marketplace.
//!
//! Defines the `MarketplaceStore` abstraction the service persists through,
//! an in-memory implementation for tests/dev and a Postgres implementation.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryMarketplaceStore;
pub use postgres::PostgresMarketplaceStore;
pub use r#trait::{MarketplaceStore, StoreError};

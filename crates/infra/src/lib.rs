//! Infrastructure layer: storage, configuration, locking and the
//! marketplace application service.

pub mod config;
pub mod locks;
pub mod service;
pub mod store;


pub use config::{ConfigError, MarketplaceConfig};
pub use service::{MarketplaceService, NewLot, OrderRequest, ServiceError, ServiceResult};
pub use store::{InMemoryMarketplaceStore, MarketplaceStore, PostgresMarketplaceStore, StoreError};

//! Configuration loading and representation.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `FARMLINK_DATABASE_URL` | unset | Postgres URL; unset selects the in-memory store |
//! | `FARMLINK_MAX_PRICE_TIERS` | `20` | Upper bound on tiers per price schedule |

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::store::{InMemoryMarketplaceStore, MarketplaceStore, PostgresMarketplaceStore, StoreError};

pub const DATABASE_URL_VAR: &str = "FARMLINK_DATABASE_URL";
pub const MAX_PRICE_TIERS_VAR: &str = "FARMLINK_MAX_PRICE_TIERS";

pub const DEFAULT_MAX_PRICE_TIERS: usize = 20;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketplaceConfig {
    pub database_url: Option<String>,
    pub max_price_tiers: usize,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_price_tiers: DEFAULT_MAX_PRICE_TIERS,
        }
    }
}

impl MarketplaceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup(DATABASE_URL_VAR)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let max_price_tiers = match lookup(MAX_PRICE_TIERS_VAR) {
            None => DEFAULT_MAX_PRICE_TIERS,
            Some(raw) => {
                let parsed = raw.trim().parse::<usize>().map_err(|e| ConfigError::Invalid {
                    var: MAX_PRICE_TIERS_VAR,
                    reason: e.to_string(),
                })?;
                if parsed == 0 {
                    return Err(ConfigError::Invalid {
                        var: MAX_PRICE_TIERS_VAR,
                        reason: "must be at least 1".to_string(),
                    });
                }
                parsed
            }
        };

        Ok(Self {
            database_url,
            max_price_tiers,
        })
    }

    /// Open the store this configuration selects.
    ///
    /// With a database URL this connects to Postgres and creates the schema;
    /// otherwise it returns an empty in-memory store.
    pub async fn open_store(&self) -> Result<Arc<dyn MarketplaceStore>, StoreError> {
        match &self.database_url {
            Some(url) => {
                let store = PostgresMarketplaceStore::connect(url).await?;
                store.ensure_schema().await?;
                info!("using postgres marketplace store");
                Ok(Arc::new(store))
            }
            None => {
                info!("using in-memory marketplace store");
                Ok(Arc::new(InMemoryMarketplaceStore::new()))
            }
        }
    }
}

//! Price feed → underlying asset resolution.
//!
//! Orders carry no asset symbol; the underlying is identified by the price
//! feed the option settles against. The registry is built from configuration
//! so deployments on different chains can supply their own feed addresses.

use std::collections::HashMap;
use std::str::FromStr;

use rfq_core::{Address, Asset};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SelectorError, SelectorResult};

/// One configured price feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Underlying asset symbol (e.g., "BTC").
    pub asset: Asset,
    /// Price feed contract address (0x...).
    pub price_feed: String,
}

/// Lookup from price feed address to underlying asset.
#[derive(Debug, Clone, Default)]
pub struct FeedRegistry {
    feeds: HashMap<Address, Asset>,
}

impl FeedRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configuration, rejecting malformed or conflicting entries.
    pub fn from_config(feeds: &[FeedConfig]) -> SelectorResult<Self> {
        let mut registry = Self::new();
        for feed in feeds {
            let address = Address::from_str(feed.price_feed.trim()).map_err(|e| {
                SelectorError::InvalidFeed(format!("{} `{}`: {e}", feed.asset, feed.price_feed))
            })?;
            registry.register(address, feed.asset)?;
        }
        debug!(feed_count = registry.len(), "Feed registry built");
        Ok(registry)
    }

    /// Register a feed. Re-registering the same pair is a no-op.
    pub fn register(&mut self, price_feed: Address, asset: Asset) -> SelectorResult<()> {
        match self.feeds.get(&price_feed) {
            Some(existing) if *existing != asset => Err(SelectorError::DuplicateFeed {
                address: price_feed.to_string(),
                first: existing.to_string(),
                second: asset.to_string(),
            }),
            _ => {
                self.feeds.insert(price_feed, asset);
                Ok(())
            }
        }
    }

    /// Underlying asset for a price feed.
    #[must_use]
    pub fn asset_for(&self, price_feed: &Address) -> Option<Asset> {
        self.feeds.get(price_feed).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }
}

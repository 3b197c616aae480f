//! Mock Oracle for testing
//!
//! Provides settable prices for exercising conversion and liquidation paths.

use rust_decimal::Decimal;
use stablemint_core::AssetId;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::OracleError;
use crate::types::{PriceOracle, PriceQuote};

/// Mock Price Oracle for testing
///
/// Stores scaled prices that can be updated between engine calls.
/// Every quote is stamped with the time of the read.
pub struct MockOracle {
    /// asset -> (price, precision)
    prices: RwLock<HashMap<AssetId, (Decimal, u32)>>,
}

impl MockOracle {
    /// Create a new empty mock oracle
    pub fn new() -> Self {
        Self {
            prices: RwLock::new(HashMap::new()),
        }
    }

    /// Set a scaled price for an asset
    pub fn set_price(&self, asset: AssetId, price: Decimal, precision: u32) {
        if let Ok(mut prices) = self.prices.write() {
            prices.insert(asset, (price, precision));
        }
    }

    /// Set a whole-unit price, scaled by `10^precision`
    pub fn set_unit_price(&self, asset: AssetId, units: i64, precision: u32) {
        let scale = Decimal::from(10u64.pow(precision));
        self.set_price(asset, Decimal::from(units) * scale, precision);
    }

    /// Remove a price (for testing feed-not-found errors)
    pub fn remove_price(&self, asset: &AssetId) {
        if let Ok(mut prices) = self.prices.write() {
            prices.remove(asset);
        }
    }

    /// Get number of configured assets
    pub fn feed_count(&self) -> usize {
        self.prices.read().map(|p| p.len()).unwrap_or(0)
    }
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceOracle for MockOracle {
    fn current_price(&self, asset: &AssetId) -> Result<PriceQuote, OracleError> {
        let prices = self.prices.read().map_err(|_| OracleError::Unavailable {
            asset: asset.clone(),
            reason: "price table poisoned".to_string(),
        })?;

        prices
            .get(asset)
            .map(|&(price, precision)| {
                PriceQuote::new(asset.clone(), price, precision).with_source("mock")
            })
            .ok_or_else(|| OracleError::FeedNotFound {
                asset: asset.clone(),
            })
    }
}

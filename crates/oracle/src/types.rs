//! Core oracle types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stablemint_core::AssetId;

use crate::OracleError;

/// A price quote as reported by a feed
///
/// `price` is a signed integer-valued decimal scaled by `10^precision`,
/// e.g. a price of 2000 units of account with precision 8 is reported
/// as `200000000000`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Asset being priced
    pub asset: AssetId,
    /// Scaled price, may be zero or negative on a broken feed
    pub price: Decimal,
    /// Power-of-ten exponent of the price scale
    pub precision: u32,
    /// When the feed last updated this price
    pub timestamp: DateTime<Utc>,
    /// Source of the price (e.g., "mock", "chainlink")
    pub source: String,
}

impl PriceQuote {
    pub fn new(asset: AssetId, price: Decimal, precision: u32) -> Self {
        Self {
            asset,
            price,
            precision,
            timestamp: Utc::now(),
            source: "unknown".to_string(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Check if price is stale (older than threshold)
    pub fn is_stale(&self, max_age_secs: u64) -> bool {
        let age = Utc::now().signed_duration_since(self.timestamp);
        age.num_seconds() > max_age_secs as i64
    }
}

/// Price Oracle trait - interface for price feeds
///
/// Implementations can be:
/// - MockOracle: For testing with settable prices
/// - StalenessGuard: Wraps another oracle and rejects old quotes
/// - On-chain or exchange-backed feeds supplied by the embedding application
pub trait PriceOracle: Send + Sync {
    /// Get the current price for an asset
    fn current_price(&self, asset: &AssetId) -> Result<PriceQuote, OracleError>;
}

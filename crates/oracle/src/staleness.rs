//! Freshness decorator for price oracles
//!
//! Not applied by the risk engine on its own; wrap a feed with it when the
//! deployment needs quotes younger than a refresh interval.

use stablemint_core::AssetId;

use crate::error::OracleError;
use crate::types::{PriceOracle, PriceQuote};

/// Rejects quotes older than `max_age_secs`
pub struct StalenessGuard<O> {
    inner: O,
    max_age_secs: u64,
}

impl<O: PriceOracle> StalenessGuard<O> {
    pub fn new(inner: O, max_age_secs: u64) -> Self {
        Self {
            inner,
            max_age_secs,
        }
    }

    pub fn max_age_secs(&self) -> u64 {
        self.max_age_secs
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }
}

impl<O: PriceOracle> PriceOracle for StalenessGuard<O> {
    fn current_price(&self, asset: &AssetId) -> Result<PriceQuote, OracleError> {
        let quote = self.inner.current_price(asset)?;

        if quote.is_stale(self.max_age_secs) {
            tracing::warn!(
                asset = %asset,
                last_update = %quote.timestamp,
                max_age_secs = self.max_age_secs,
                "Rejected stale price quote"
            );
            return Err(OracleError::StalePrice {
                asset: asset.clone(),
                last_update: quote.timestamp.to_rfc3339(),
                threshold_secs: self.max_age_secs,
            });
        }

        Ok(quote)
    }
}

//! Oracle error types

use stablemint_core::AssetId;
use thiserror::Error;

/// Oracle-related errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// No feed configured for the asset
    #[error("No price feed for {asset}")]
    FeedNotFound { asset: AssetId },

    /// Price data is stale (older than threshold)
    #[error("Stale price for {asset}: last update was {last_update}, threshold is {threshold_secs}s")]
    StalePrice {
        asset: AssetId,
        last_update: String,
        threshold_secs: u64,
    },

    /// Feed is unavailable
    #[error("Price feed for {asset} unavailable: {reason}")]
    Unavailable { asset: AssetId, reason: String },
}

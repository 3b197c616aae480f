//! Stablemint Price Oracle
//!
//! Price Oracle Adapter contract used by the risk engine for value conversion.
//! Quotes are fetched synchronously and never cached by the consumer.
//! Ships `MockOracle` for tests and `StalenessGuard` as an optional freshness check.

mod error;
mod mock;
mod staleness;
mod types;

pub use error::OracleError;
pub use mock::MockOracle;
pub use staleness::StalenessGuard;
pub use types::{PriceOracle, PriceQuote};

//! Value conversion between collateral amounts and the unit of account
//!
//! Every conversion reads a fresh quote from the collateral's oracle; quotes
//! are never cached. Results are truncated toward zero, so conversions may
//! lose value to rounding but never create it.
//!
//! The liability token is pegged 1:1 to the unit of account and never goes
//! through these functions.

use rust_decimal::Decimal;
use stablemint_core::{Amount, AssetId};
use stablemint_oracle::PriceQuote;

use crate::error::{EngineError, EngineResult};
use crate::registry::CollateralRegistry;

/// `10^precision`; precision is bounded by the registry
fn pow10(precision: u32) -> Decimal {
    Decimal::from(10u64.pow(precision))
}

fn to_amount(value: Decimal) -> EngineResult<Amount> {
    Amount::new(value).map_err(|_| EngineError::MathOverflow)
}

impl CollateralRegistry {
    /// Fresh, validated quote for a registered collateral
    ///
    /// Fails if the feed reports a non-positive price or a precision other
    /// than the one the collateral was registered with.
    pub fn quote(&self, asset: &AssetId) -> EngineResult<PriceQuote> {
        let entry = self.get(asset)?;
        let quote = entry.oracle().current_price(asset)?;

        if quote.price <= Decimal::ZERO {
            tracing::warn!(asset = %asset, price = %quote.price, "Oracle reported non-positive price");
            return Err(EngineError::InvalidPrice {
                asset: asset.clone(),
                price: quote.price,
            });
        }
        if quote.precision != entry.precision() {
            return Err(EngineError::PrecisionMismatch {
                asset: asset.clone(),
                registered: entry.precision(),
                reported: quote.precision,
            });
        }

        Ok(quote)
    }

    /// Price of one whole collateral unit, without truncation
    pub fn unit_price(&self, asset: &AssetId) -> EngineResult<Decimal> {
        let quote = self.quote(asset)?;
        quote
            .price
            .checked_div(pow10(quote.precision))
            .ok_or(EngineError::MathOverflow)
    }

    /// `price * amount / 10^precision`, truncated
    pub fn to_unit_of_account(&self, asset: &AssetId, amount: Amount) -> EngineResult<Amount> {
        self.get(asset)?;
        if amount.is_zero() {
            return Ok(Amount::ZERO);
        }

        let quote = self.quote(asset)?;
        let value = quote
            .price
            .checked_mul(amount.value())
            .and_then(|scaled| scaled.checked_div(pow10(quote.precision)))
            .ok_or(EngineError::MathOverflow)?;

        to_amount(value.trunc())
    }

    /// `value / unit_price(asset)`, truncated
    ///
    /// Divides by the exact price of one unit rather than its truncated
    /// value, so `from_unit_of_account(to_unit_of_account(c, a), c) <= a`.
    pub fn from_unit_of_account(&self, value: Amount, asset: &AssetId) -> EngineResult<Amount> {
        self.get(asset)?;
        if value.is_zero() {
            return Ok(Amount::ZERO);
        }

        let quote = self.quote(asset)?;
        let amount = value
            .value()
            .checked_mul(pow10(quote.precision))
            .and_then(|scaled| scaled.checked_div(quote.price))
            .ok_or(EngineError::MathOverflow)?;

        to_amount(amount.trunc())
    }

    /// Amount of `to` worth the same as `amount` of `from`
    pub fn convert(&self, from: &AssetId, amount: Amount, to: &AssetId) -> EngineResult<Amount> {
        self.get(from)?;
        self.get(to)?;

        let value = self.to_unit_of_account(from, amount)?;
        self.from_unit_of_account(value, to)
    }
}

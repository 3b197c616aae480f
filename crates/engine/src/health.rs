//! Health-factor arithmetic
//!
//! An account is healthy while
//! `deposit_value * threshold_percent >= debt_value * SCALE_FACTOR`.
//! All inputs are unit-of-account values; limits are truncated to whole
//! units so a reported limit can always be retried as-is.

use rust_decimal::Decimal;
use stablemint_core::Amount;

use crate::config::SCALE_FACTOR;
use crate::error::{EngineError, EngineResult};

fn scaled(value: Amount, factor: u64) -> EngineResult<Decimal> {
    value
        .checked_mul_u64(factor)
        .map(|scaled| scaled.value())
        .ok_or(EngineError::MathOverflow)
}

/// `deposit_value * threshold` and `debt_value * SCALE_FACTOR`
fn sides(deposit_value: Amount, debt_value: Amount, threshold: u8) -> EngineResult<(Decimal, Decimal)> {
    Ok((
        scaled(deposit_value, u64::from(threshold))?,
        scaled(debt_value, SCALE_FACTOR)?,
    ))
}

fn clamp_trunc(value: Decimal) -> Amount {
    Amount::new(value.trunc()).unwrap_or(Amount::ZERO)
}

pub fn is_healthy(deposit_value: Amount, debt_value: Amount, threshold: u8) -> EngineResult<bool> {
    let (backing, required) = sides(deposit_value, debt_value, threshold)?;
    Ok(backing >= required)
}

/// Largest additional debt that keeps the account healthy
///
/// `(deposit_value * threshold - debt_value * SCALE_FACTOR) / SCALE_FACTOR`,
/// zero when the account is already at or past the limit.
pub fn max_mintable(deposit_value: Amount, debt_value: Amount, threshold: u8) -> EngineResult<Amount> {
    let (backing, required) = sides(deposit_value, debt_value, threshold)?;
    let headroom = backing
        .checked_sub(required)
        .and_then(|h| h.checked_div(Decimal::from(SCALE_FACTOR)))
        .ok_or(EngineError::MathOverflow)?;
    Ok(clamp_trunc(headroom))
}

/// Largest deposit value that can be withdrawn while staying healthy
///
/// `(deposit_value * threshold - debt_value * SCALE_FACTOR) / threshold`.
pub fn max_redeemable_value(
    deposit_value: Amount,
    debt_value: Amount,
    threshold: u8,
) -> EngineResult<Amount> {
    let (backing, required) = sides(deposit_value, debt_value, threshold)?;
    let headroom = backing
        .checked_sub(required)
        .and_then(|h| h.checked_div(Decimal::from(threshold)))
        .ok_or(EngineError::MathOverflow)?;
    Ok(clamp_trunc(headroom))
}

/// `deposit_value * threshold / (debt_value * SCALE_FACTOR)`
///
/// 1.0 is the liquidation boundary. `None` without debt.
pub fn health_factor(
    deposit_value: Amount,
    debt_value: Amount,
    threshold: u8,
) -> EngineResult<Option<Decimal>> {
    if debt_value.is_zero() {
        return Ok(None);
    }
    let (backing, required) = sides(deposit_value, debt_value, threshold)?;
    backing
        .checked_div(required)
        .map(Some)
        .ok_or(EngineError::MathOverflow)
}

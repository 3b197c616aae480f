//! Read-only accessors and account reporting
//!
//! Nothing here takes the reentrancy guard, so collaborators can read the
//! engine from inside a callback and see the pending change. Values are
//! computed on demand from fresh quotes and never stored.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stablemint_core::{AccountId, Amount, AssetId};
use stablemint_oracle::{PriceOracle, PriceQuote};
use std::sync::Arc;
use strum_macros::Display;

use crate::config::SCALE_FACTOR;
use crate::engine::RiskEngine;
use crate::error::EngineResult;
use crate::event::EventRecord;
use crate::health;
use crate::registry::CollateralRegistry;

/// Whether a holding backs debt or is the debt token itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum HoldingKind {
    Collateral,
    Liability,
}

/// One line of an account's holdings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingView {
    pub token: AssetId,
    pub kind: HoldingKind,
    pub amount: Amount,
    /// Unit-of-account price of one whole token
    pub unit_price: Decimal,
    pub value: Amount,
}

/// Debt and deposit value of one account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInformation {
    pub debt: Amount,
    pub deposit_value: Amount,
}

impl RiskEngine {
    // === Registry ===

    /// Account that custodies collateral and owns the mint capability
    pub fn address(&self) -> &AccountId {
        &self.address
    }

    pub fn registry(&self) -> &CollateralRegistry {
        &self.registry
    }

    pub fn collateral_count(&self) -> usize {
        self.registry.len()
    }

    /// Collateral at `index` in registration order
    pub fn collateral_at(&self, index: usize) -> EngineResult<AssetId> {
        Ok(self.registry.collateral_at(index)?.clone())
    }

    /// Oracle and price precision registered for `asset`
    pub fn collateral_feed(&self, asset: &AssetId) -> EngineResult<(Arc<dyn PriceOracle>, u32)> {
        let entry = self.registry.get(asset)?;
        Ok((entry.oracle().clone(), entry.precision()))
    }

    pub fn threshold_percent(&self) -> u8 {
        self.registry.threshold_percent()
    }

    pub fn scale_factor(&self) -> u64 {
        SCALE_FACTOR
    }

    pub fn liability_token(&self) -> &AssetId {
        self.registry.liability_token()
    }

    // === Prices ===

    /// Fresh validated quote for a collateral
    pub fn price_quote(&self, asset: &AssetId) -> EngineResult<PriceQuote> {
        self.registry.quote(asset)
    }

    pub fn unit_price(&self, asset: &AssetId) -> EngineResult<Decimal> {
        self.registry.unit_price(asset)
    }

    // === Accounts ===

    pub fn collateral_deposited(&self, account: &AccountId, asset: &AssetId) -> EngineResult<Amount> {
        self.registry.get(asset)?;
        Ok(self.state().ledger.deposit(account, asset))
    }

    /// Unit-of-account value of all of `account`'s deposits
    pub fn deposit_value(&self, account: &AccountId) -> EngineResult<Amount> {
        self.deposit_value_of(&self.position(account))
    }

    pub fn debt(&self, account: &AccountId) -> Amount {
        self.state().ledger.debt(account)
    }

    /// Debt in the unit of account; the liability token is pegged 1:1
    pub fn debt_value(&self, account: &AccountId) -> Amount {
        self.debt(account)
    }

    pub fn account_information(&self, account: &AccountId) -> EngineResult<AccountInformation> {
        let position = self.position(account);
        Ok(AccountInformation {
            debt: position.debt,
            deposit_value: self.deposit_value_of(&position)?,
        })
    }

    /// Every registered collateral, then the liability token
    pub fn holdings(&self, account: &AccountId) -> EngineResult<Vec<HoldingView>> {
        let position = self.position(account);
        let mut holdings = Vec::with_capacity(self.registry.len() + 1);

        for asset in self.registry.assets() {
            let amount = position.deposit(asset);
            holdings.push(HoldingView {
                token: asset.clone(),
                kind: HoldingKind::Collateral,
                amount,
                unit_price: self.registry.unit_price(asset)?,
                value: self.registry.to_unit_of_account(asset, amount)?,
            });
        }

        holdings.push(HoldingView {
            token: self.registry.liability_token().clone(),
            kind: HoldingKind::Liability,
            amount: position.debt,
            unit_price: Decimal::ONE,
            value: position.debt,
        });

        Ok(holdings)
    }

    // === Health ===

    /// `None` when the account has no debt
    pub fn health_factor(&self, account: &AccountId) -> EngineResult<Option<Decimal>> {
        let info = self.account_information(account)?;
        health::health_factor(info.deposit_value, info.debt, self.threshold_percent())
    }

    /// Additional debt `account` could take on right now
    pub fn max_mintable(&self, account: &AccountId) -> EngineResult<Amount> {
        let info = self.account_information(account)?;
        health::max_mintable(info.deposit_value, info.debt, self.threshold_percent())
    }

    /// Amount of `asset` that `account` could redeem right now
    pub fn max_redeemable(&self, account: &AccountId, asset: &AssetId) -> EngineResult<Amount> {
        self.registry.get(asset)?;
        self.max_safe_redeem(&self.position(account), asset)
    }

    /// True when the account's debt exceeds what its deposits support
    pub fn is_liquidatable(&self, account: &AccountId) -> EngineResult<bool> {
        let info = self.account_information(account)?;
        if info.debt.is_zero() {
            return Ok(false);
        }
        Ok(!health::is_healthy(info.deposit_value, info.debt, self.threshold_percent())?)
    }

    // === Totals ===

    /// Sum of every account's deposit in `asset`
    pub fn total_deposited(&self, asset: &AssetId) -> EngineResult<Amount> {
        self.registry.get(asset)?;
        Ok(self.state().ledger.total_deposited(asset))
    }

    /// Sum of every account's debt
    pub fn total_debt(&self) -> Amount {
        self.state().ledger.total_debt()
    }

    // === Events ===

    /// Committed records, oldest first
    pub fn events(&self) -> Vec<EventRecord> {
        self.state().events.records().to_vec()
    }

    /// Take all committed records
    ///
    /// Rejected while an operation is in flight.
    pub fn drain_events(&self) -> EngineResult<Vec<EventRecord>> {
        let _entered = self.guard.enter()?;
        Ok(self.state().events.drain())
    }
}

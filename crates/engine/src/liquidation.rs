//! Liquidation of accounts that breach the threshold
//!
//! All-or-nothing: the liquidator repays the target's whole debt with its
//! own liability tokens and receives every unit of the target's collateral.
//! The liquidator's profit is the spread between the collateral's value and
//! the debt at the moment of the breach; there is no separate fee.

use serde::{Deserialize, Serialize};
use stablemint_core::{AccountId, Amount};
use stablemint_token::{LiabilityToken, Token};
use strum_macros::Display;

use crate::engine::RiskEngine;
use crate::error::{EngineError, EngineResult};
use crate::event::{EngineEvent, SeizedCollateral};
use crate::health;

/// Why an account cannot be targeted
///
/// Checked in declaration order; the first match is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum InvalidTargetReason {
    #[strum(serialize = "null account")]
    NullAccount,
    /// Whoever the liability token reports as its owner
    ///
    /// With `SyntheticToken` this is always the engine itself, which
    /// therefore never reaches the `Engine` check.
    #[strum(serialize = "liability token owner")]
    TokenOwner,
    /// The engine's own custody account
    ///
    /// Only reported when the liability token names some other owner.
    #[strum(serialize = "engine account")]
    Engine,
    #[strum(serialize = "self-liquidation")]
    SelfLiquidation,
}

/// Liquidation result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationOutcome {
    /// Account that was force-closed
    pub target: AccountId,
    /// Debt repaid by the liquidator
    pub debt_cleared: Amount,
    /// Value of the seized collateral at liquidation time
    pub deposit_value_cleared: Amount,
    /// Collateral transferred to the liquidator, in registration order
    pub collateral_seized: Vec<SeizedCollateral>,
}

impl LiquidationOutcome {
    /// `deposit_value_cleared - debt_cleared`, in the unit of account
    pub fn liquidator_gain(&self) -> Amount {
        self.deposit_value_cleared.saturating_sub(&self.debt_cleared)
    }
}

impl RiskEngine {
    /// Force-close `target`'s position on behalf of `liquidator`
    ///
    /// `liquidator` must hold and have approved the engine for liability
    /// tokens covering the target's full debt.
    pub fn liquidate(
        &self,
        liquidator: &AccountId,
        target: &AccountId,
    ) -> EngineResult<LiquidationOutcome> {
        self.execute("liquidate", || self.liquidate_inner(liquidator, target))
    }

    fn check_target(&self, liquidator: &AccountId, target: &AccountId) -> EngineResult<()> {
        let reason = if target.is_null() {
            Some(InvalidTargetReason::NullAccount)
        } else if *target == self.liability.owner() {
            Some(InvalidTargetReason::TokenOwner)
        } else if *target == self.address {
            Some(InvalidTargetReason::Engine)
        } else if target == liquidator {
            Some(InvalidTargetReason::SelfLiquidation)
        } else {
            None
        };

        match reason {
            Some(reason) => Err(EngineError::InvalidTarget {
                target: target.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }

    fn liquidate_inner(
        &self,
        liquidator: &AccountId,
        target: &AccountId,
    ) -> EngineResult<LiquidationOutcome> {
        self.check_target(liquidator, target)?;

        let position = self.position(target);
        let deposit_value = self.deposit_value_of(&position)?;
        if deposit_value.is_zero() {
            return Err(EngineError::NoDeposits {
                target: target.clone(),
            });
        }

        let debt = position.debt;
        if debt.is_zero() {
            return Err(EngineError::NoDebt {
                target: target.clone(),
            });
        }

        let held = self.liability.balance_of(liquidator);
        if held < debt {
            return Err(EngineError::LiquidatorBalanceInsufficient { needed: debt, held });
        }

        if health::is_healthy(deposit_value, debt, self.registry.threshold_percent())? {
            return Err(EngineError::NotLiquidatable {
                target: target.clone(),
            });
        }

        let collateral_seized: Vec<SeizedCollateral> = self
            .registry
            .assets()
            .iter()
            .map(|asset| SeizedCollateral {
                asset: asset.clone(),
                amount: position.deposit(asset),
            })
            .filter(|seized| seized.amount.is_positive())
            .collect();

        {
            let mut state = self.state();
            state.ledger.decrease_debt(target, debt)?;
            for seized in &collateral_seized {
                state
                    .ledger
                    .debit_collateral(target, &seized.asset, seized.amount)?;
            }
            state.events.emit(EngineEvent::Liquidated {
                target: target.clone(),
                liquidator: liquidator.clone(),
                debt_cleared: debt,
                deposit_value_cleared: deposit_value,
                collateral_seized: collateral_seized.clone(),
            });
        }

        self.pull_and_burn(liquidator, debt)?;
        for seized in &collateral_seized {
            self.release_collateral(&seized.asset, liquidator, seized.amount)?;
        }

        tracing::info!(
            target = %target,
            liquidator = %liquidator,
            debt_cleared = %debt,
            deposit_value_cleared = %deposit_value,
            "Account liquidated"
        );

        Ok(LiquidationOutcome {
            target: target.clone(),
            debt_cleared: debt,
            deposit_value_cleared: deposit_value,
            collateral_seized,
        })
    }
}

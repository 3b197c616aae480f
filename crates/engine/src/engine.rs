//! Risk engine implementation
//!
//! Every mutating operation runs in two phases: validate, write the ledger,
//! and emit its records; then call the token collaborators to move the
//! matching balances. Collaborator calls happen after the ledger already
//! reflects the change and while the reentrancy guard is engaged, so a
//! callback can observe the pending state but cannot mutate it. Any error
//! in either phase reverts the ledger, the event log, and every token to
//! where they stood before the call.

use stablemint_core::{AccountId, Amount, AssetId};
use stablemint_token::{LiabilityToken, MintAuthority, Token, TokenError, Transactional};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{EngineError, EngineResult};
use crate::event::{EngineEvent, EventLog};
use crate::guard::ReentrancyGuard;
use crate::health;
use crate::ledger::{AccountLedger, AccountPosition};
use crate::registry::CollateralRegistry;

/// Mutable engine state
#[derive(Debug, Default)]
pub(crate) struct EngineState {
    pub(crate) ledger: AccountLedger,
    pub(crate) events: EventLog,
}

/// Risk Engine - custodian of collateral and sole issuer of the liability token
///
/// Methods take `&self` so the engine can be shared through `Arc`,
/// including with collaborators that try to call back into it.
pub struct RiskEngine {
    pub(crate) address: AccountId,
    pub(crate) registry: CollateralRegistry,
    pub(crate) liability: Arc<dyn LiabilityToken>,
    pub(crate) authority: MintAuthority,
    pub(crate) state: Mutex<EngineState>,
    pub(crate) guard: ReentrancyGuard,
}

impl RiskEngine {
    /// Create an engine that custodies collateral at `address`
    ///
    /// `authority` must be the liability token's mint capability, already
    /// transferred to `address`.
    pub fn new(
        address: AccountId,
        registry: CollateralRegistry,
        liability: Arc<dyn LiabilityToken>,
        authority: MintAuthority,
    ) -> EngineResult<Self> {
        if address.is_null() {
            return Err(TokenError::ZeroAddress.into());
        }

        let matches_token =
            authority.token() == liability.id() && authority.token() == registry.liability_token();
        let held_by_engine = *authority.holder() == address && liability.owner() == address;
        if !matches_token || !held_by_engine {
            tracing::warn!(
                token = %authority.token(),
                holder = %authority.holder(),
                engine = %address,
                "Mint capability does not belong to engine"
            );
            return Err(EngineError::AuthorityMismatch {
                token: authority.token().clone(),
                holder: authority.holder().clone(),
            });
        }

        tracing::info!(
            engine = %address,
            liability = %liability.id(),
            collaterals = registry.len(),
            threshold_percent = registry.threshold_percent(),
            "Risk engine started"
        );

        Ok(Self {
            address,
            registry,
            liability,
            authority,
            state: Mutex::new(EngineState::default()),
            guard: ReentrancyGuard::new(),
        })
    }

    /// Lock engine state
    ///
    /// Never held across a collaborator call.
    pub(crate) fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // === Execution discipline ===

    /// Run `f` as one all-or-nothing operation
    pub(crate) fn execute<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce() -> EngineResult<T>,
    ) -> EngineResult<T> {
        let _entered = self.guard.enter().map_err(|e| {
            tracing::warn!(operation, "Reentrant call rejected");
            e
        })?;

        let (ledger_mark, event_mark) = {
            let state = self.state();
            (state.ledger.checkpoint(), state.events.mark())
        };
        self.checkpoint_tokens();

        match f() {
            Ok(value) => {
                self.state().ledger.commit(ledger_mark);
                self.commit_tokens();
                Ok(value)
            }
            Err(e) => {
                {
                    let mut state = self.state();
                    state.ledger.revert_to(ledger_mark);
                    state.events.revert_to(event_mark);
                }
                self.revert_tokens();
                tracing::warn!(operation, error = %e, "Operation reverted");
                Err(e)
            }
        }
    }

    fn checkpoint_tokens(&self) {
        self.liability.checkpoint();
        for (_, entry) in self.registry.iter() {
            entry.token().checkpoint();
        }
    }

    fn commit_tokens(&self) {
        self.liability.commit();
        for (_, entry) in self.registry.iter() {
            entry.token().commit();
        }
    }

    fn revert_tokens(&self) {
        self.liability.revert();
        for (_, entry) in self.registry.iter() {
            entry.token().revert();
        }
    }

    // === Public operations ===

    /// Lock `amount` of `asset` from `account` into engine custody
    ///
    /// `account` must have approved the engine for at least `amount`.
    pub fn deposit(&self, account: &AccountId, asset: &AssetId, amount: Amount) -> EngineResult<()> {
        self.execute("deposit", || self.deposit_inner(account, asset, amount))
    }

    /// Issue `amount` liability tokens to `account` against its deposits
    pub fn mint(&self, account: &AccountId, amount: Amount) -> EngineResult<()> {
        self.execute("mint", || self.mint_inner(account, amount))
    }

    /// Withdraw `amount` of `asset` from `account`'s deposit
    pub fn redeem(&self, account: &AccountId, asset: &AssetId, amount: Amount) -> EngineResult<()> {
        self.execute("redeem", || self.redeem_inner(account, account, asset, amount))
    }

    /// Repay `amount` of `account`'s debt with its own liability tokens
    ///
    /// `account` must have approved the engine for at least `amount`.
    pub fn burn(&self, account: &AccountId, amount: Amount) -> EngineResult<()> {
        self.execute("burn", || self.burn_inner(account, account, amount))
    }

    pub fn deposit_and_mint(
        &self,
        account: &AccountId,
        asset: &AssetId,
        deposit_amount: Amount,
        mint_amount: Amount,
    ) -> EngineResult<()> {
        self.execute("deposit_and_mint", || {
            self.deposit_inner(account, asset, deposit_amount)?;
            self.mint_inner(account, mint_amount)
        })
    }

    pub fn burn_and_redeem(
        &self,
        account: &AccountId,
        burn_amount: Amount,
        asset: &AssetId,
        redeem_amount: Amount,
    ) -> EngineResult<()> {
        self.execute("burn_and_redeem", || {
            self.burn_inner(account, account, burn_amount)?;
            self.redeem_inner(account, account, asset, redeem_amount)
        })
    }

    // === Unguarded building blocks ===

    fn deposit_inner(&self, account: &AccountId, asset: &AssetId, amount: Amount) -> EngineResult<()> {
        if !amount.is_positive() {
            return Err(EngineError::ZeroAmount);
        }
        let entry = self.registry.get(asset)?;

        {
            let mut state = self.state();
            state.ledger.credit_collateral(account, asset, amount)?;
            state
                .events
                .emit(EngineEvent::collateral_deposited(account, asset, amount));
        }

        entry
            .token()
            .transfer_from(&self.address, account, &self.address, amount)?;

        tracing::debug!(account = %account, asset = %asset, amount = %amount, "Collateral deposited");
        Ok(())
    }

    fn mint_inner(&self, account: &AccountId, amount: Amount) -> EngineResult<()> {
        if !amount.is_positive() {
            return Err(EngineError::ZeroAmount);
        }

        let position = self.position(account);
        let deposit_value = self.deposit_value_of(&position)?;
        let new_debt = position
            .debt
            .checked_add(&amount)
            .ok_or(EngineError::MathOverflow)?;

        let threshold = self.registry.threshold_percent();
        if !health::is_healthy(deposit_value, new_debt, threshold)? {
            let max_safe = health::max_mintable(deposit_value, position.debt, threshold)?;
            tracing::warn!(
                account = %account,
                requested = %amount,
                max_safe = %max_safe,
                "Mint would breach threshold"
            );
            return Err(EngineError::MintLimitBreached {
                account: account.clone(),
                requested: amount,
                max_safe,
            });
        }

        {
            let mut state = self.state();
            state.ledger.increase_debt(account, amount)?;
            state.events.emit(EngineEvent::debt_minted(account, amount));
        }

        self.liability.mint(&self.authority, account, amount)?;

        tracing::debug!(account = %account, amount = %amount, "Debt minted");
        Ok(())
    }

    /// Move `amount` of `from`'s deposit to `to`, keeping `from` healthy
    fn redeem_inner(
        &self,
        from: &AccountId,
        to: &AccountId,
        asset: &AssetId,
        amount: Amount,
    ) -> EngineResult<()> {
        if !amount.is_positive() {
            return Err(EngineError::ZeroAmount);
        }
        self.registry.get(asset)?;

        let position = self.position(from);
        let held = position.deposit(asset);
        if held < amount {
            return Err(EngineError::InsufficientDeposit {
                account: from.clone(),
                asset: asset.clone(),
                held,
                requested: amount,
            });
        }

        // Without debt the whole deposit is free
        if !position.debt.is_zero() {
            if !self.redeem_keeps_healthy(&position, asset, amount)? {
                let max_safe = self.max_safe_redeem(&position, asset)?;
                tracing::warn!(
                    account = %from,
                    asset = %asset,
                    requested = %amount,
                    max_safe = %max_safe,
                    "Redeem would breach threshold"
                );
                return Err(EngineError::RedeemLimitBreached {
                    account: from.clone(),
                    asset: asset.clone(),
                    requested: amount,
                    max_safe,
                });
            }
        }

        {
            let mut state = self.state();
            state.ledger.debit_collateral(from, asset, amount)?;
            state
                .events
                .emit(EngineEvent::collateral_redeemed(from, to, asset, amount));
        }

        self.release_collateral(asset, to, amount)?;

        tracing::debug!(from = %from, to = %to, asset = %asset, amount = %amount, "Collateral redeemed");
        Ok(())
    }

    /// Repay `on_behalf_of`'s debt with `payer`'s liability tokens
    fn burn_inner(
        &self,
        on_behalf_of: &AccountId,
        payer: &AccountId,
        amount: Amount,
    ) -> EngineResult<()> {
        if !amount.is_positive() {
            return Err(EngineError::ZeroAmount);
        }

        let debt = self.state().ledger.debt(on_behalf_of);
        if debt < amount {
            return Err(EngineError::InsufficientDebtBalance {
                account: on_behalf_of.clone(),
                held: debt,
                requested: amount,
            });
        }

        let balance = self.liability.balance_of(payer);
        if balance < amount {
            return Err(EngineError::InsufficientLiabilityBalance {
                account: payer.clone(),
                held: balance,
                requested: amount,
            });
        }

        {
            let mut state = self.state();
            state.ledger.decrease_debt(on_behalf_of, amount)?;
            state
                .events
                .emit(EngineEvent::debt_burned(on_behalf_of, payer, amount));
        }

        self.pull_and_burn(payer, amount)?;

        tracing::debug!(account = %on_behalf_of, payer = %payer, amount = %amount, "Debt burned");
        Ok(())
    }

    // === Collaborator calls ===

    /// Pull `amount` liability tokens from `payer` and destroy them
    pub(crate) fn pull_and_burn(&self, payer: &AccountId, amount: Amount) -> EngineResult<()> {
        self.liability
            .transfer_from(&self.address, payer, &self.address, amount)?;
        self.liability.burn(&self.authority, amount)?;
        Ok(())
    }

    /// Push `amount` of custodied `asset` to `to`
    pub(crate) fn release_collateral(
        &self,
        asset: &AssetId,
        to: &AccountId,
        amount: Amount,
    ) -> EngineResult<()> {
        let entry = self.registry.get(asset)?;
        entry.token().transfer(&self.address, to, amount)?;
        Ok(())
    }

    // === Valuation helpers ===

    pub(crate) fn position(&self, account: &AccountId) -> AccountPosition {
        self.state().ledger.position(account)
    }

    /// Unit-of-account value of every deposit in `position`
    ///
    /// Reads one fresh quote per collateral with a non-zero deposit.
    pub(crate) fn deposit_value_of(&self, position: &AccountPosition) -> EngineResult<Amount> {
        let mut total = Amount::ZERO;
        for asset in self.registry.assets() {
            let value = self
                .registry
                .to_unit_of_account(asset, position.deposit(asset))?;
            total = total.checked_add(&value).ok_or(EngineError::MathOverflow)?;
        }
        Ok(total)
    }

    /// Whether `position` stays healthy once `amount` of `asset` is gone
    ///
    /// Values the position after the debit, so truncation applies to what
    /// actually remains.
    pub(crate) fn redeem_keeps_healthy(
        &self,
        position: &AccountPosition,
        asset: &AssetId,
        amount: Amount,
    ) -> EngineResult<bool> {
        let remaining = position
            .deposit(asset)
            .checked_sub(&amount)
            .ok_or(EngineError::MathOverflow)?;
        let mut after = position.clone();
        after.deposits.insert(asset.clone(), remaining);

        let remaining_value = self.deposit_value_of(&after)?;
        health::is_healthy(remaining_value, position.debt, self.registry.threshold_percent())
    }

    /// Largest amount of `asset` that `position` can redeem, in whole units
    ///
    /// The limit value is truncated before conversion, so the returned amount
    /// always passes `redeem_keeps_healthy`.
    pub(crate) fn max_safe_redeem(
        &self,
        position: &AccountPosition,
        asset: &AssetId,
    ) -> EngineResult<Amount> {
        let held = position.deposit(asset);
        if position.debt.is_zero() || held.is_zero() {
            return Ok(held);
        }

        let deposit_value = self.deposit_value_of(position)?;
        let max_value = health::max_redeemable_value(
            deposit_value,
            position.debt,
            self.registry.threshold_percent(),
        )?;
        Ok(self.registry.from_unit_of_account(max_value, asset)?.min(held))
    }
}

impl std::fmt::Debug for RiskEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskEngine")
            .field("address", &self.address)
            .field("registry", &self.registry)
            .field("liability", self.liability.id())
            .finish()
    }
}

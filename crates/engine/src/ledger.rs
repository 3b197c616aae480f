//! Per-account collateral and debt ledger
//!
//! The canonical mutable state of the engine. Every write records the slot's
//! previous value in a journal, so an operation that fails after touching
//! the ledger can be rolled back to an earlier mark exactly.

use stablemint_core::{AccountId, Amount, AssetId};
use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};

/// Deposits and debt of one account
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountPosition {
    /// Deposit per collateral; missing means zero
    pub deposits: HashMap<AssetId, Amount>,
    /// Outstanding liability, 1:1 with the unit of account
    pub debt: Amount,
}

impl AccountPosition {
    pub fn deposit(&self, asset: &AssetId) -> Amount {
        self.deposits.get(asset).copied().unwrap_or(Amount::ZERO)
    }

    /// True when nothing is deposited and nothing is owed
    pub fn is_empty(&self) -> bool {
        self.debt.is_zero() && self.deposits.values().all(Amount::is_zero)
    }
}

/// A slot's value before it was overwritten
#[derive(Debug, Clone)]
enum LedgerChange {
    /// Position did not exist before
    Opened { account: AccountId },
    Deposit {
        account: AccountId,
        asset: AssetId,
        previous: Amount,
    },
    Debt {
        account: AccountId,
        previous: Amount,
    },
}

/// Account ledger with an undo journal
#[derive(Debug, Default)]
pub struct AccountLedger {
    positions: HashMap<AccountId, AccountPosition>,
    journal: Vec<LedgerChange>,
}

impl AccountLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get deposit for an account (returns 0 if not found)
    pub fn deposit(&self, account: &AccountId, asset: &AssetId) -> Amount {
        self.positions
            .get(account)
            .map(|position| position.deposit(asset))
            .unwrap_or(Amount::ZERO)
    }

    /// Get debt for an account (returns 0 if not found)
    pub fn debt(&self, account: &AccountId) -> Amount {
        self.positions
            .get(account)
            .map(|position| position.debt)
            .unwrap_or(Amount::ZERO)
    }

    /// Snapshot of an account's position
    pub fn position(&self, account: &AccountId) -> AccountPosition {
        self.positions.get(account).cloned().unwrap_or_default()
    }

    /// Sum of every account's deposit in `asset`
    pub fn total_deposited(&self, asset: &AssetId) -> Amount {
        self.positions
            .values()
            .map(|position| position.deposit(asset))
            .sum()
    }

    /// Sum of every account's debt
    pub fn total_debt(&self) -> Amount {
        self.positions.values().map(|position| position.debt).sum()
    }

    /// Number of accounts touched by a committed write
    pub fn account_count(&self) -> usize {
        self.positions.len()
    }

    pub fn credit_collateral(
        &mut self,
        account: &AccountId,
        asset: &AssetId,
        amount: Amount,
    ) -> EngineResult<Amount> {
        let current = self.deposit(account, asset);
        let updated = current
            .checked_add(&amount)
            .ok_or(EngineError::MathOverflow)?;
        self.set_deposit(account, asset, updated);
        Ok(updated)
    }

    pub fn debit_collateral(
        &mut self,
        account: &AccountId,
        asset: &AssetId,
        amount: Amount,
    ) -> EngineResult<Amount> {
        let held = self.deposit(account, asset);
        let updated = held
            .checked_sub(&amount)
            .ok_or_else(|| EngineError::InsufficientDeposit {
                account: account.clone(),
                asset: asset.clone(),
                held,
                requested: amount,
            })?;
        self.set_deposit(account, asset, updated);
        Ok(updated)
    }

    pub fn increase_debt(&mut self, account: &AccountId, amount: Amount) -> EngineResult<Amount> {
        let updated = self
            .debt(account)
            .checked_add(&amount)
            .ok_or(EngineError::MathOverflow)?;
        self.set_debt(account, updated);
        Ok(updated)
    }

    pub fn decrease_debt(&mut self, account: &AccountId, amount: Amount) -> EngineResult<Amount> {
        let held = self.debt(account);
        let updated = held
            .checked_sub(&amount)
            .ok_or_else(|| EngineError::InsufficientDebtBalance {
                account: account.clone(),
                held,
                requested: amount,
            })?;
        self.set_debt(account, updated);
        Ok(updated)
    }

    /// Position for `account`, journaling its creation
    fn open(&mut self, account: &AccountId) -> &mut AccountPosition {
        if !self.positions.contains_key(account) {
            self.journal.push(LedgerChange::Opened {
                account: account.clone(),
            });
        }
        self.positions.entry(account.clone()).or_default()
    }

    fn set_deposit(&mut self, account: &AccountId, asset: &AssetId, amount: Amount) {
        let position = self.open(account);
        let previous = position.deposits.insert(asset.clone(), amount);
        self.journal.push(LedgerChange::Deposit {
            account: account.clone(),
            asset: asset.clone(),
            previous: previous.unwrap_or(Amount::ZERO),
        });
    }

    fn set_debt(&mut self, account: &AccountId, amount: Amount) {
        let position = self.open(account);
        let previous = std::mem::replace(&mut position.debt, amount);
        self.journal.push(LedgerChange::Debt {
            account: account.clone(),
            previous,
        });
    }

    // === Journal ===

    /// Mark the current journal position
    pub fn checkpoint(&self) -> usize {
        self.journal.len()
    }

    /// Undo every write made after `mark`, newest first
    pub fn revert_to(&mut self, mark: usize) {
        while self.journal.len() > mark {
            let Some(change) = self.journal.pop() else {
                break;
            };
            match change {
                LedgerChange::Opened { account } => {
                    self.positions.remove(&account);
                }
                LedgerChange::Deposit {
                    account,
                    asset,
                    previous,
                } => {
                    if let Some(position) = self.positions.get_mut(&account) {
                        position.deposits.insert(asset, previous);
                    }
                }
                LedgerChange::Debt { account, previous } => {
                    if let Some(position) = self.positions.get_mut(&account) {
                        position.debt = previous;
                    }
                }
            }
        }
    }

    /// Keep every write made after `mark`
    ///
    /// The outermost commit empties the journal.
    pub fn commit(&mut self, mark: usize) {
        if mark == 0 {
            self.journal.clear();
        }
    }

    /// Number of journaled writes not yet committed
    pub fn pending_changes(&self) -> usize {
        self.journal.len()
    }
}

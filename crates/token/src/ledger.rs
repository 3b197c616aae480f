//! In-memory token ledger
//!
//! Balances, allowances, and total supply for one asset, with a stack of
//! snapshots backing `Transactional`.

use stablemint_core::{AccountId, Amount, AssetId};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::TokenError;
use crate::traits::{Token, Transactional};

#[derive(Debug, Clone, Default)]
struct Balances {
    balances: HashMap<AccountId, Amount>,
    allowances: HashMap<(AccountId, AccountId), Amount>,
    total_supply: Amount,
}

impl Balances {
    fn balance(&self, holder: &AccountId) -> Amount {
        self.balances.get(holder).copied().unwrap_or(Amount::ZERO)
    }

    fn debit(&mut self, holder: &AccountId, amount: Amount) -> Result<(), TokenError> {
        let available = self.balance(holder);
        let remaining =
            available
                .checked_sub(&amount)
                .ok_or_else(|| TokenError::InsufficientBalance {
                    holder: holder.clone(),
                    available,
                    required: amount,
                })?;
        self.balances.insert(holder.clone(), remaining);
        Ok(())
    }

    fn credit(&mut self, holder: &AccountId, amount: Amount) -> Result<(), TokenError> {
        let updated = self
            .balance(holder)
            .checked_add(&amount)
            .ok_or(TokenError::Overflow)?;
        self.balances.insert(holder.clone(), updated);
        Ok(())
    }

    fn move_balance(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        if from.is_null() || to.is_null() {
            return Err(TokenError::ZeroAddress);
        }
        self.debit(from, amount)?;
        self.credit(to, amount)
    }
}

#[derive(Debug, Default)]
struct Inner {
    current: Balances,
    checkpoints: Vec<Balances>,
}

/// Single-asset in-memory token
///
/// Every method takes `&self`; state sits behind a mutex so the token can be
/// shared through `Arc` with the engine and with test code at the same time.
#[derive(Debug)]
pub struct TokenLedger {
    id: AssetId,
    inner: Mutex<Inner>,
}

impl TokenLedger {
    pub fn new(id: AssetId) -> Self {
        Self {
            id,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create new supply for `to` (faucet for collateral assets)
    pub fn issue(&self, to: &AccountId, amount: Amount) -> Result<(), TokenError> {
        if to.is_null() {
            return Err(TokenError::ZeroAddress);
        }
        let mut inner = self.lock();
        let total_supply = inner
            .current
            .total_supply
            .checked_add(&amount)
            .ok_or(TokenError::Overflow)?;
        inner.current.credit(to, amount)?;
        inner.current.total_supply = total_supply;
        Ok(())
    }

    /// Destroy `amount` from `from`
    pub fn destroy(&self, from: &AccountId, amount: Amount) -> Result<(), TokenError> {
        let mut inner = self.lock();
        inner.current.debit(from, amount)?;
        inner.current.total_supply = inner.current.total_supply.saturating_sub(&amount);
        Ok(())
    }

    /// Number of open checkpoints
    pub fn checkpoint_depth(&self) -> usize {
        self.lock().checkpoints.len()
    }
}

impl Transactional for TokenLedger {
    fn checkpoint(&self) {
        let mut inner = self.lock();
        let snapshot = inner.current.clone();
        inner.checkpoints.push(snapshot);
    }

    fn commit(&self) {
        self.lock().checkpoints.pop();
    }

    fn revert(&self) {
        let mut inner = self.lock();
        if let Some(snapshot) = inner.checkpoints.pop() {
            inner.current = snapshot;
        }
    }
}

impl Token for TokenLedger {
    fn id(&self) -> &AssetId {
        &self.id
    }

    fn total_supply(&self) -> Amount {
        self.lock().current.total_supply
    }

    fn balance_of(&self, holder: &AccountId) -> Amount {
        self.lock().current.balance(holder)
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.lock()
            .current
            .allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    fn approve(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        if owner.is_null() || spender.is_null() {
            return Err(TokenError::ZeroAddress);
        }
        self.lock()
            .current
            .allowances
            .insert((owner.clone(), spender.clone()), amount);
        Ok(())
    }

    fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.lock().current.move_balance(from, to, amount)
    }

    fn transfer_from(
        &self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let mut inner = self.lock();
        let key = (from.clone(), spender.clone());
        let available = inner
            .current
            .allowances
            .get(&key)
            .copied()
            .unwrap_or(Amount::ZERO);
        let remaining =
            available
                .checked_sub(&amount)
                .ok_or_else(|| TokenError::InsufficientAllowance {
                    owner: from.clone(),
                    spender: spender.clone(),
                    available,
                    required: amount,
                })?;

        // Balance first so a failed move leaves the allowance untouched
        inner.current.move_balance(from, to, amount)?;
        inner.current.allowances.insert(key, remaining);
        Ok(())
    }
}

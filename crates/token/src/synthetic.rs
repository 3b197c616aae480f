//! Liability token with a single-owner mint capability
//!
//! `SyntheticToken::new` issues exactly one `MintAuthority` to the bootstrap
//! account. The capability is moved (never copied) to the risk engine at
//! bring-up; from then on only the engine can mint or burn.

use stablemint_core::{AccountId, Amount, AssetId};
use std::sync::RwLock;

use crate::error::TokenError;
use crate::ledger::TokenLedger;
use crate::traits::{LiabilityToken, Token, Transactional};

/// Mint/burn capability for one liability token
///
/// Not `Clone`, and only this crate can construct one.
#[derive(Debug, PartialEq, Eq)]
pub struct MintAuthority {
    token: AssetId,
    holder: AccountId,
}

impl MintAuthority {
    pub(crate) fn new(token: AssetId, holder: AccountId) -> Self {
        Self { token, holder }
    }

    pub fn token(&self) -> &AssetId {
        &self.token
    }

    pub fn holder(&self) -> &AccountId {
        &self.holder
    }
}

/// In-memory liability token
#[derive(Debug)]
pub struct SyntheticToken {
    ledger: TokenLedger,
    owner: RwLock<AccountId>,
}

impl SyntheticToken {
    /// Create the token and the one capability that controls its supply
    pub fn new(id: AssetId, bootstrap: AccountId) -> Result<(Self, MintAuthority), TokenError> {
        if bootstrap.is_null() {
            return Err(TokenError::ZeroAddress);
        }
        let authority = MintAuthority::new(id.clone(), bootstrap.clone());
        let token = Self {
            ledger: TokenLedger::new(id),
            owner: RwLock::new(bootstrap),
        };
        Ok((token, authority))
    }

    fn check_authority(&self, authority: &MintAuthority) -> Result<(), TokenError> {
        let owner = self.owner();
        if authority.token != *self.ledger.id() || authority.holder != owner {
            tracing::warn!(
                token = %self.ledger.id(),
                caller = %authority.holder,
                owner = %owner,
                "Rejected mint capability"
            );
            return Err(TokenError::Unauthorized {
                caller: authority.holder.clone(),
            });
        }
        Ok(())
    }
}

impl Transactional for SyntheticToken {
    fn checkpoint(&self) {
        self.ledger.checkpoint();
    }

    fn commit(&self) {
        self.ledger.commit();
    }

    fn revert(&self) {
        self.ledger.revert();
    }
}

impl Token for SyntheticToken {
    fn id(&self) -> &AssetId {
        self.ledger.id()
    }

    fn total_supply(&self) -> Amount {
        self.ledger.total_supply()
    }

    fn balance_of(&self, holder: &AccountId) -> Amount {
        self.ledger.balance_of(holder)
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.ledger.allowance(owner, spender)
    }

    fn approve(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.ledger.approve(owner, spender, amount)
    }

    fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.ledger.transfer(from, to, amount)
    }

    fn transfer_from(
        &self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.ledger.transfer_from(spender, from, to, amount)
    }
}

impl LiabilityToken for SyntheticToken {
    fn owner(&self) -> AccountId {
        self.owner
            .read()
            .map(|owner| owner.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn mint(
        &self,
        authority: &MintAuthority,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.check_authority(authority)?;
        if !amount.is_positive() {
            return Err(TokenError::ZeroAmount);
        }
        self.ledger.issue(to, amount)
    }

    fn burn(&self, authority: &MintAuthority, amount: Amount) -> Result<(), TokenError> {
        self.check_authority(authority)?;
        if !amount.is_positive() {
            return Err(TokenError::ZeroAmount);
        }
        self.ledger.destroy(&authority.holder, amount)
    }

    fn transfer_ownership(
        &self,
        authority: MintAuthority,
        new_owner: AccountId,
    ) -> Result<MintAuthority, TokenError> {
        self.check_authority(&authority)?;
        if new_owner.is_null() {
            return Err(TokenError::ZeroAddress);
        }

        let mut owner = self
            .owner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *owner = new_owner.clone();

        tracing::info!(
            token = %authority.token,
            from = %authority.holder,
            to = %new_owner,
            "Mint capability transferred"
        );
        Ok(MintAuthority::new(authority.token, new_owner))
    }
}

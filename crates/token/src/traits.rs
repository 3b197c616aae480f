//! Token collaborator contracts

use stablemint_core::{AccountId, Amount, AssetId};

use crate::error::TokenError;
use crate::synthetic::MintAuthority;

/// All-or-nothing participation in a caller's operation
///
/// Checkpoints nest. Every `checkpoint` is closed by exactly one `commit`
/// (keep changes) or `revert` (restore the state captured at the checkpoint).
pub trait Transactional {
    fn checkpoint(&self);
    fn commit(&self);
    fn revert(&self);
}

/// Transferable balance with allowance-based pulls
///
/// Collateral assets and the liability token both implement this.
/// A failing call must leave the token unchanged.
pub trait Token: Transactional + Send + Sync {
    /// Asset handle this token is registered under
    fn id(&self) -> &AssetId;

    fn total_supply(&self) -> Amount;

    fn balance_of(&self, holder: &AccountId) -> Amount;

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount;

    /// Set `spender`'s allowance over `owner`'s balance
    fn approve(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError>;

    /// Push `amount` from `from` to `to`
    fn transfer(&self, from: &AccountId, to: &AccountId, amount: Amount)
        -> Result<(), TokenError>;

    /// Pull `amount` from `from` to `to`, spending `spender`'s allowance
    fn transfer_from(
        &self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError>;
}

/// Token whose supply is controlled by a single capability holder
pub trait LiabilityToken: Token {
    /// Current holder of the mint/burn capability
    fn owner(&self) -> AccountId;

    /// Create `amount` new tokens for `to`
    fn mint(
        &self,
        authority: &MintAuthority,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError>;

    /// Destroy `amount` tokens from the authority holder's own balance
    fn burn(&self, authority: &MintAuthority, amount: Amount) -> Result<(), TokenError>;

    /// Hand the capability to `new_owner`, consuming the old one
    fn transfer_ownership(
        &self,
        authority: MintAuthority,
        new_owner: AccountId,
    ) -> Result<MintAuthority, TokenError>;
}

//! Risk engine errors

use rust_decimal::Decimal;
use stablemint_core::{AccountId, Amount, AssetId};
use stablemint_oracle::OracleError;
use stablemint_token::TokenError;
use thiserror::Error;

use crate::liquidation::InvalidTargetReason;

/// Errors raised while building or reading the collateral registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Liability token reference is null")]
    NullLiabilityToken,

    #[error("Threshold percent {0} outside [1, 99]")]
    ThresholdOutOfRange(u8),

    #[error("Parameter lists differ in length: {collaterals} collaterals, {oracles} oracles, {precisions} precisions")]
    LengthMismatch {
        collaterals: usize,
        oracles: usize,
        precisions: usize,
    },

    #[error("Collateral at index {index} has a null identifier")]
    NullCollateral { index: usize },

    #[error("Collateral at index {index} has zero price precision")]
    ZeroPrecision { index: usize },

    #[error("Collateral at index {index} has precision {precision}, max is {max}")]
    PrecisionOutOfRange {
        index: usize,
        precision: u32,
        max: u32,
    },

    #[error("Collateral {asset} registered twice")]
    DuplicateCollateral { asset: AssetId },

    #[error("Collateral index {index} out of range (count {count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("Collateral {asset} is not registered")]
    UnregisteredCollateral { asset: AssetId },
}

/// Errors raised by risk engine operations
///
/// Every error aborts the operation and reverses all of its effects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    // === Input validation ===
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error(transparent)]
    Registry(#[from] RegistryError),

    // === Insufficient balance ===
    #[error("Insufficient deposit for {account} in {asset}: held {held}, requested {requested}")]
    InsufficientDeposit {
        account: AccountId,
        asset: AssetId,
        held: Amount,
        requested: Amount,
    },

    #[error("Insufficient debt for {account}: held {held}, requested {requested}")]
    InsufficientDebtBalance {
        account: AccountId,
        held: Amount,
        requested: Amount,
    },

    #[error("Insufficient liability tokens for {account}: held {held}, requested {requested}")]
    InsufficientLiabilityBalance {
        account: AccountId,
        held: Amount,
        requested: Amount,
    },

    // === Invariant breach ===
    #[error("Mint would breach threshold for {account}: requested {requested}, max safe {max_safe}")]
    MintLimitBreached {
        account: AccountId,
        requested: Amount,
        max_safe: Amount,
    },

    #[error("Redeem would breach threshold for {account} in {asset}: requested {requested}, max safe {max_safe}")]
    RedeemLimitBreached {
        account: AccountId,
        asset: AssetId,
        requested: Amount,
        max_safe: Amount,
    },

    // === Oracle ===
    #[error("Invalid price for {asset}: {price}")]
    InvalidPrice { asset: AssetId, price: Decimal },

    #[error("Price precision mismatch for {asset}: registered {registered}, reported {reported}")]
    PrecisionMismatch {
        asset: AssetId,
        registered: u32,
        reported: u32,
    },

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    // === Liquidation eligibility ===
    #[error("Invalid liquidation target {target}: {reason}")]
    InvalidTarget {
        target: AccountId,
        reason: InvalidTargetReason,
    },

    #[error("Target {target} has no deposits")]
    NoDeposits { target: AccountId },

    #[error("Target {target} has no debt")]
    NoDebt { target: AccountId },

    #[error("Liquidator balance insufficient: needed {needed}, held {held}")]
    LiquidatorBalanceInsufficient { needed: Amount, held: Amount },

    #[error("Target {target} is within threshold")]
    NotLiquidatable { target: AccountId },

    // === Collaborators and execution ===
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Reentrant call rejected")]
    Reentrancy,

    #[error("Arithmetic overflow")]
    MathOverflow,

    #[error("Mint capability for {token} held by {holder} does not belong to this engine")]
    AuthorityMismatch { token: AssetId, holder: AccountId },
}

pub type EngineResult<T> = Result<T, EngineError>;

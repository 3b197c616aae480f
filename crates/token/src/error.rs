//! Token errors

use stablemint_core::{AccountId, Amount};
use thiserror::Error;

/// Errors raised by token collaborators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Insufficient balance for {holder}: available {available}, required {required}")]
    InsufficientBalance {
        holder: AccountId,
        available: Amount,
        required: Amount,
    },

    #[error("Insufficient allowance from {owner} to {spender}: available {available}, required {required}")]
    InsufficientAllowance {
        owner: AccountId,
        spender: AccountId,
        available: Amount,
        required: Amount,
    },

    #[error("Null account not allowed")]
    ZeroAddress,

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Caller {caller} is not authorized")]
    Unauthorized { caller: AccountId },

    #[error("Balance overflow")]
    Overflow,

    #[error("Transfer rejected: {0}")]
    Rejected(String),
}

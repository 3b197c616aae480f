//! Stablemint Tokens - Collaborator token contracts
//!
//! The risk engine never owns balances itself; it moves them through these traits.
//!
//! # Key Types
//! - `Token`: Transferable balance with allowances (collateral assets)
//! - `LiabilityToken`: `Token` whose mint/burn is gated by a `MintAuthority`
//! - `Transactional`: Checkpoint/commit/revert hooks so a failed engine
//!   operation leaves no trace in token balances
//! - `TokenLedger` / `SyntheticToken`: In-memory implementations

pub mod error;
pub mod ledger;
pub mod synthetic;
pub mod traits;

pub use error::TokenError;
pub use ledger::TokenLedger;
pub use synthetic::{MintAuthority, SyntheticToken};
pub use traits::{LiabilityToken, Token, Transactional};

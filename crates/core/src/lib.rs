//! Stablemint Core - Domain types
//!
//! This crate contains the fundamental types shared across Stablemint:
//! - `Amount`: Non-negative decimal wrapper for token amounts and values
//! - `AccountId` / `AssetId`: Opaque uppercase handles with a null value

pub mod amount;
pub mod id;

pub use amount::{Amount, AmountError};
pub use id::{AccountId, AssetId, IdError};

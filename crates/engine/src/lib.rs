//! Stablemint Risk Engine - Collateral custody, debt issuance, liquidation
//!
//! The engine keeps a per-account ledger of deposited collateral and
//! outstanding debt, and enforces on every mutating operation that
//! `deposit_value * threshold_percent >= debt_value * SCALE_FACTOR`.
//! Accounts that fall below the line can be force-closed by any holder of
//! enough liability tokens.
//!
//! Operations are serialized by a reentrancy guard and are all-or-nothing:
//! a failure anywhere reverts the ledger, the event log, and every token
//! collaborator.

pub mod config;
pub mod conversion;
pub mod engine;
pub mod error;
pub mod event;
pub mod guard;
pub mod health;
pub mod ledger;
pub mod liquidation;
pub mod registry;
pub mod report;

pub use config::{EngineConfig, MAX_PRICE_PRECISION, SCALE_FACTOR};
pub use engine::RiskEngine;
pub use error::{EngineError, EngineResult, RegistryError};
pub use event::{EngineEvent, EventRecord, SeizedCollateral};
pub use guard::ReentrancyGuard;
pub use ledger::{AccountLedger, AccountPosition};
pub use liquidation::{InvalidTargetReason, LiquidationOutcome};
pub use registry::{CollateralEntry, CollateralRegistry};
pub use report::{AccountInformation, HoldingKind, HoldingView};

//! Change records emitted by the risk engine
//!
//! Every successful mutating operation appends one record per change. A
//! failed operation discards its records along with the rest of its
//! effects, so sequence numbers are only consumed by committed records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stablemint_core::{AccountId, Amount, AssetId};
use strum_macros::IntoStaticStr;

/// Collateral moved to a liquidator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeizedCollateral {
    pub asset: AssetId,
    pub amount: Amount,
}

/// Events emitted by the risk engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr)]
pub enum EngineEvent {
    /// Collateral locked into engine custody
    CollateralDeposited {
        account: AccountId,
        asset: AssetId,
        amount: Amount,
    },

    /// Liability tokens issued against collateral
    DebtMinted { account: AccountId, amount: Amount },

    /// Collateral released from `from`'s deposit to `to`
    CollateralRedeemed {
        from: AccountId,
        to: AccountId,
        asset: AssetId,
        amount: Amount,
    },

    /// Debt of `on_behalf_of` repaid with `payer`'s liability tokens
    DebtBurned {
        on_behalf_of: AccountId,
        payer: AccountId,
        amount: Amount,
    },

    /// Account force-closed
    Liquidated {
        target: AccountId,
        liquidator: AccountId,
        debt_cleared: Amount,
        /// Unit-of-account value of the seized deposits at liquidation time
        deposit_value_cleared: Amount,
        collateral_seized: Vec<SeizedCollateral>,
    },
}

impl EngineEvent {
    pub fn collateral_deposited(account: &AccountId, asset: &AssetId, amount: Amount) -> Self {
        Self::CollateralDeposited {
            account: account.clone(),
            asset: asset.clone(),
            amount,
        }
    }

    pub fn debt_minted(account: &AccountId, amount: Amount) -> Self {
        Self::DebtMinted {
            account: account.clone(),
            amount,
        }
    }

    pub fn collateral_redeemed(
        from: &AccountId,
        to: &AccountId,
        asset: &AssetId,
        amount: Amount,
    ) -> Self {
        Self::CollateralRedeemed {
            from: from.clone(),
            to: to.clone(),
            asset: asset.clone(),
            amount,
        }
    }

    pub fn debt_burned(on_behalf_of: &AccountId, payer: &AccountId, amount: Amount) -> Self {
        Self::DebtBurned {
            on_behalf_of: on_behalf_of.clone(),
            payer: payer.clone(),
            amount,
        }
    }

    /// Variant name, for logging
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// A committed event with its position in the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Starts at 1, strictly increasing
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub event: EngineEvent,
}

/// Position in the event log to roll back to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMark {
    len: usize,
    next_sequence: u64,
}

/// Append-only log with rollback to a mark
#[derive(Debug)]
pub struct EventLog {
    records: Vec<EventRecord>,
    next_sequence: u64,
}

impl Default for EventLog {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            next_sequence: 1,
        }
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: EngineEvent) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        tracing::trace!(sequence, event = event.name(), "Event emitted");
        self.records.push(EventRecord {
            sequence,
            timestamp: Utc::now(),
            event,
        });
        sequence
    }

    pub fn mark(&self) -> EventMark {
        EventMark {
            len: self.records.len(),
            next_sequence: self.next_sequence,
        }
    }

    /// Drop every record emitted after `mark`
    pub fn revert_to(&mut self, mark: EventMark) {
        self.records.truncate(mark.len);
        self.next_sequence = mark.next_sequence;
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Take all records; sequence numbering continues
    pub fn drain(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

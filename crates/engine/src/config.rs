//! Engine configuration
//!
//! Risk parameters are fixed for the lifetime of an engine. Defaults apply
//! to any field missing from a deserialized config.

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Multiplier used to keep threshold math in integers
pub const SCALE_FACTOR: u64 = 100;

/// Largest accepted price precision exponent
pub const MAX_PRICE_PRECISION: u32 = 18;

/// Configuration for the risk engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Share of deposit value (in percent) that may back debt.
    /// 50 means every unit of debt needs two units of collateral value.
    #[serde(default = "default_threshold_percent")]
    pub threshold_percent: u8,
}

fn default_threshold_percent() -> u8 {
    50
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threshold_percent: default_threshold_percent(),
        }
    }
}

impl EngineConfig {
    pub fn with_threshold(threshold_percent: u8) -> Self {
        Self { threshold_percent }
    }

    /// Threshold must lie in [1, 99]
    pub fn validate(&self) -> Result<(), RegistryError> {
        if !(1..=99).contains(&self.threshold_percent) {
            return Err(RegistryError::ThresholdOutOfRange(self.threshold_percent));
        }
        Ok(())
    }
}

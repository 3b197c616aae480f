//! Collateral registry
//!
//! Immutable set of accepted collateral types, each bound to the token that
//! holds it, the oracle that prices it, and the precision of that price.
//! Built once; there is no way to add, remove, or edit an entry afterwards.

use stablemint_core::AssetId;
use stablemint_oracle::PriceOracle;
use stablemint_token::Token;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::{EngineConfig, MAX_PRICE_PRECISION};
use crate::error::RegistryError;

/// One accepted collateral type
#[derive(Clone)]
pub struct CollateralEntry {
    token: Arc<dyn Token>,
    oracle: Arc<dyn PriceOracle>,
    precision: u32,
}

impl CollateralEntry {
    pub fn token(&self) -> &Arc<dyn Token> {
        &self.token
    }

    pub fn oracle(&self) -> &Arc<dyn PriceOracle> {
        &self.oracle
    }

    /// Power-of-ten exponent of the oracle's price scale
    pub fn precision(&self) -> u32 {
        self.precision
    }
}

impl fmt::Debug for CollateralEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollateralEntry")
            .field("asset", self.token.id())
            .field("precision", &self.precision)
            .finish()
    }
}

/// Registry of accepted collateral plus the global risk parameters
pub struct CollateralRegistry {
    entries: HashMap<AssetId, CollateralEntry>,
    /// Registration order, used for iteration
    order: Vec<AssetId>,
    liability_token: AssetId,
    threshold_percent: u8,
}

impl CollateralRegistry {
    /// Build the registry from parallel lists
    ///
    /// `collaterals[i]` is priced by `oracles[i]` at precision `precisions[i]`.
    /// Nothing is created unless every check passes.
    pub fn new(
        collaterals: Vec<Arc<dyn Token>>,
        oracles: Vec<Arc<dyn PriceOracle>>,
        precisions: Vec<u32>,
        liability_token: &AssetId,
        config: &EngineConfig,
    ) -> Result<Self, RegistryError> {
        if liability_token.is_null() {
            return Err(RegistryError::NullLiabilityToken);
        }
        config.validate()?;

        if collaterals.len() != oracles.len() || collaterals.len() != precisions.len() {
            return Err(RegistryError::LengthMismatch {
                collaterals: collaterals.len(),
                oracles: oracles.len(),
                precisions: precisions.len(),
            });
        }

        let mut entries = HashMap::with_capacity(collaterals.len());
        let mut order = Vec::with_capacity(collaterals.len());

        for (index, ((token, oracle), precision)) in collaterals
            .into_iter()
            .zip(oracles)
            .zip(precisions)
            .enumerate()
        {
            let asset = token.id().clone();
            if asset.is_null() {
                return Err(RegistryError::NullCollateral { index });
            }
            if precision == 0 {
                return Err(RegistryError::ZeroPrecision { index });
            }
            if precision > MAX_PRICE_PRECISION {
                return Err(RegistryError::PrecisionOutOfRange {
                    index,
                    precision,
                    max: MAX_PRICE_PRECISION,
                });
            }
            if entries.contains_key(&asset) || asset == *liability_token {
                return Err(RegistryError::DuplicateCollateral { asset });
            }

            entries.insert(
                asset.clone(),
                CollateralEntry {
                    token,
                    oracle,
                    precision,
                },
            );
            order.push(asset);
        }

        Ok(Self {
            entries,
            order,
            liability_token: liability_token.clone(),
            threshold_percent: config.threshold_percent,
        })
    }

    /// Number of registered collateral types
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Collateral at `index` in registration order
    pub fn collateral_at(&self, index: usize) -> Result<&AssetId, RegistryError> {
        self.order.get(index).ok_or(RegistryError::IndexOutOfRange {
            index,
            count: self.order.len(),
        })
    }

    /// All collateral identifiers in registration order
    pub fn assets(&self) -> &[AssetId] {
        &self.order
    }

    pub fn contains(&self, asset: &AssetId) -> bool {
        self.entries.contains_key(asset)
    }

    pub fn get(&self, asset: &AssetId) -> Result<&CollateralEntry, RegistryError> {
        self.entries
            .get(asset)
            .ok_or_else(|| RegistryError::UnregisteredCollateral {
                asset: asset.clone(),
            })
    }

    /// Entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&AssetId, &CollateralEntry)> {
        self.order
            .iter()
            .filter_map(move |asset| self.entries.get(asset).map(|entry| (asset, entry)))
    }

    pub fn liability_token(&self) -> &AssetId {
        &self.liability_token
    }

    pub fn threshold_percent(&self) -> u8 {
        self.threshold_percent
    }
}

impl fmt::Debug for CollateralRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollateralRegistry")
            .field("collaterals", &self.order)
            .field("liability_token", &self.liability_token)
            .field("threshold_percent", &self.threshold_percent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stablemint_oracle::MockOracle;
    use stablemint_token::TokenLedger;

    fn token(id: &str) -> Arc<dyn Token> {
        Arc::new(TokenLedger::new(AssetId::new(id).unwrap()))
    }

    fn oracle() -> Arc<dyn PriceOracle> {
        Arc::new(MockOracle::new())
    }

    fn susd() -> AssetId {
        AssetId::new("SUSD").unwrap()
    }

    #[test]
    fn test_registers_in_order() {
        let registry = CollateralRegistry::new(
            vec![token("WETH"), token("WBTC")],
            vec![oracle(), oracle()],
            vec![8, 8],
            &susd(),
            &EngineConfig::default(),
        )
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.collateral_at(0).unwrap().as_str(), "WETH");
        assert_eq!(registry.collateral_at(1).unwrap().as_str(), "WBTC");
        assert_eq!(
            registry.collateral_at(2),
            Err(RegistryError::IndexOutOfRange { index: 2, count: 2 })
        );
        assert_eq!(registry.get(&AssetId::new("WBTC").unwrap()).unwrap().precision(), 8);
    }

    #[test]
    fn test_length_mismatch() {
        let result = CollateralRegistry::new(
            vec![token("WETH"), token("WBTC")],
            vec![oracle(), oracle()],
            vec![8, 8, 8],
            &susd(),
            &EngineConfig::default(),
        );
        assert_eq!(
            result.unwrap_err(),
            RegistryError::LengthMismatch {
                collaterals: 2,
                oracles: 2,
                precisions: 3
            }
        );
    }

    #[test]
    fn test_null_liability_token_checked_first() {
        let result = CollateralRegistry::new(
            vec![token("WETH")],
            vec![],
            vec![],
            &AssetId::NULL,
            &EngineConfig::with_threshold(0),
        );
        assert_eq!(result.unwrap_err(), RegistryError::NullLiabilityToken);
    }

    #[test]
    fn test_threshold_out_of_range() {
        let result = CollateralRegistry::new(
            vec![],
            vec![],
            vec![],
            &susd(),
            &EngineConfig::with_threshold(100),
        );
        assert_eq!(result.unwrap_err(), RegistryError::ThresholdOutOfRange(100));
    }

    #[test]
    fn test_null_collateral() {
        let null_token: Arc<dyn Token> = Arc::new(TokenLedger::new(AssetId::NULL));
        let result = CollateralRegistry::new(
            vec![token("WETH"), null_token],
            vec![oracle(), oracle()],
            vec![8, 8],
            &susd(),
            &EngineConfig::default(),
        );
        assert_eq!(result.unwrap_err(), RegistryError::NullCollateral { index: 1 });
    }

    #[test]
    fn test_zero_and_oversized_precision() {
        let zero = CollateralRegistry::new(
            vec![token("WETH")],
            vec![oracle()],
            vec![0],
            &susd(),
            &EngineConfig::default(),
        );
        assert_eq!(zero.unwrap_err(), RegistryError::ZeroPrecision { index: 0 });

        let oversized = CollateralRegistry::new(
            vec![token("WETH")],
            vec![oracle()],
            vec![MAX_PRICE_PRECISION + 1],
            &susd(),
            &EngineConfig::default(),
        );
        assert!(matches!(
            oversized.unwrap_err(),
            RegistryError::PrecisionOutOfRange { index: 0, .. }
        ));
    }

    #[test]
    fn test_duplicate_rejected() {
        let result = CollateralRegistry::new(
            vec![token("WETH"), token("weth")],
            vec![oracle(), oracle()],
            vec![8, 8],
            &susd(),
            &EngineConfig::default(),
        );
        assert!(matches!(
            result.unwrap_err(),
            RegistryError::DuplicateCollateral { .. }
        ));

        let liability_as_collateral = CollateralRegistry::new(
            vec![token("SUSD")],
            vec![oracle()],
            vec![8],
            &susd(),
            &EngineConfig::default(),
        );
        assert!(liability_as_collateral.is_err());
    }

    #[test]
    fn test_unregistered_lookup() {
        let registry = CollateralRegistry::new(
            vec![token("WETH")],
            vec![oracle()],
            vec![8],
            &susd(),
            &EngineConfig::default(),
        )
        .unwrap();

        let result = registry.get(&AssetId::new("DOGE").unwrap());
        assert!(matches!(
            result,
            Err(RegistryError::UnregisteredCollateral { .. })
        ));
    }
}

//! Construction-time configuration
//!
//! The approved collateral set, its price feeds and the synthetic authority
//! are fixed when the engine is built. There is nothing to adjust later.

use serde::{Deserialize, Serialize};

use crate::constants::domain;
use crate::errors::{SppError, SppResult};
use crate::types::{Address, CollateralConfig, LiquidationBonus};

/// Engine configuration
///
/// ```json
/// {
///   "collateral_assets": ["0x…weth", "0x…wbtc"],
///   "price_feeds": ["0x…eth-usd", "0x…btc-usd"],
///   "synthetic": "0x…spp",
///   "liquidation_bonus": "multiplier"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Approved collateral assets, in valuation order
    pub collateral_assets: Vec<Address>,
    /// Price feed for each asset, same order and length
    pub price_feeds: Vec<Address>,
    /// Synthetic-asset authority (the SPP token)
    pub synthetic: Address,
    /// Liquidator incentive formula
    #[serde(default)]
    pub liquidation_bonus: LiquidationBonus,
}

impl EngineConfig {
    pub fn new(collateral_assets: Vec<Address>, price_feeds: Vec<Address>, synthetic: Address) -> Self {
        Self {
            collateral_assets,
            price_feeds,
            synthetic,
            liquidation_bonus: LiquidationBonus::default(),
        }
    }

    pub fn with_liquidation_bonus(mut self, liquidation_bonus: LiquidationBonus) -> Self {
        self.liquidation_bonus = liquidation_bonus;
        self
    }

    /// Parse a JSON configuration document
    pub fn from_json(json: &str) -> SppResult<Self> {
        serde_json::from_str(json).map_err(|e| SppError::InvalidConfig {
            reason: e.to_string(),
        })
    }

    /// Pair assets with their feeds, rejecting malformed lists.
    ///
    /// # Errors
    /// - `ConfigurationMismatch` if the lists differ in length
    /// - `DuplicateCollateral` if an asset is listed twice
    /// - `InvalidAddress` for a zero synthetic, asset or feed address
    pub fn collateral(&self) -> SppResult<Vec<CollateralConfig>> {
        if self.collateral_assets.len() != self.price_feeds.len() {
            return Err(SppError::ConfigurationMismatch {
                assets: self.collateral_assets.len(),
                price_feeds: self.price_feeds.len(),
            });
        }
        if self.synthetic.is_zero() {
            return Err(SppError::InvalidAddress {
                reason: "synthetic cannot be zero address",
            });
        }

        let mut pairs: Vec<CollateralConfig> = Vec::with_capacity(self.collateral_assets.len());
        for (asset, price_feed) in self.collateral_assets.iter().zip(&self.price_feeds) {
            if asset.is_zero() {
                return Err(SppError::InvalidAddress {
                    reason: "collateral asset cannot be zero address",
                });
            }
            if price_feed.is_zero() {
                return Err(SppError::InvalidAddress {
                    reason: "price feed cannot be zero address",
                });
            }
            if pairs.iter().any(|c| c.asset == *asset) {
                return Err(SppError::DuplicateCollateral { asset: *asset });
            }
            pairs.push(CollateralConfig {
                asset: *asset,
                price_feed: *price_feed,
            });
        }
        Ok(pairs)
    }

    /// Custody address of the engine built from this configuration
    pub fn engine_address(&self) -> Address {
        Address::derive(domain::ENGINE_CUSTODY, &[self.synthetic.as_bytes()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    #[test]
    fn test_mismatched_lists_rejected() {
        let config = EngineConfig::new(vec![addr("weth"), addr("wbtc")], vec![addr("eth-usd")], addr("spp"));
        assert_eq!(
            config.collateral(),
            Err(SppError::ConfigurationMismatch { assets: 2, price_feeds: 1 })
        );
    }

    #[test]
    fn test_duplicate_asset_rejected() {
        let config = EngineConfig::new(
            vec![addr("weth"), addr("weth")],
            vec![addr("eth-usd"), addr("eth-usd-2")],
            addr("spp"),
        );
        assert_eq!(config.collateral(), Err(SppError::DuplicateCollateral { asset: addr("weth") }));
    }

    #[test]
    fn test_zero_addresses_rejected() {
        let config = EngineConfig::new(vec![addr("weth")], vec![Address::ZERO], addr("spp"));
        assert!(matches!(config.collateral(), Err(SppError::InvalidAddress { .. })));

        let config = EngineConfig::new(vec![addr("weth")], vec![addr("eth-usd")], Address::ZERO);
        assert!(matches!(config.collateral(), Err(SppError::InvalidAddress { .. })));
    }

    #[test]
    fn test_from_json() {
        let json = format!(
            r#"{{
                "collateral_assets": ["{}"],
                "price_feeds": ["{}"],
                "synthetic": "{}",
                "liquidation_bonus": "percent"
            }}"#,
            addr("weth"),
            addr("eth-usd"),
            addr("spp"),
        );
        let config = EngineConfig::from_json(&json).unwrap();
        assert_eq!(config.collateral_assets, vec![addr("weth")]);
        assert_eq!(config.liquidation_bonus, LiquidationBonus::Percent);
        assert_eq!(config.collateral().unwrap()[0].price_feed, addr("eth-usd"));
    }

    #[test]
    fn test_from_json_defaults_to_literal_bonus() {
        let json = format!(
            r#"{{"collateral_assets": [], "price_feeds": [], "synthetic": "{}"}}"#,
            addr("spp")
        );
        let config = EngineConfig::from_json(&json).unwrap();
        assert_eq!(config.liquidation_bonus, LiquidationBonus::Multiplier);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(EngineConfig::from_json("{"), Err(SppError::InvalidConfig { .. })));
    }

    #[test]
    fn test_engine_address_is_deterministic() {
        let config = EngineConfig::new(vec![addr("weth")], vec![addr("eth-usd")], addr("spp"));
        assert_eq!(config.engine_address(), config.clone().engine_address());
        assert_ne!(config.engine_address(), addr("spp"));
    }
}

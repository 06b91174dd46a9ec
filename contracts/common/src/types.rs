//! Core Types for the SPP engine
//!
//! Fundamental data structures shared by the engine and its collaborators.

use core::fmt;
use core::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::{domain, health, precision};
use crate::errors::SppError;

// ============ Identities ============

/// 32-byte account / contract identity.
///
/// Rendered and parsed as `0x`-prefixed lowercase hex.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, BorshSerialize, BorshDeserialize,
    Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; 32]);

impl Address {
    /// The zero address (never a valid participant)
    pub const ZERO: Address = Address([0u8; 32]);

    /// Returns true for the zero address
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Derive an address from a domain tag and arbitrary parts
    pub fn derive(tag: &[u8], parts: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(tag);
        for part in parts {
            hasher.update(part);
        }
        let mut id = [0u8; 32];
        id.copy_from_slice(&hasher.finalize());
        Self(id)
    }

    /// Deterministic address for a human-readable label ("alice", "weth")
    pub fn from_label(label: &str) -> Self {
        Self::derive(domain::LABEL, &[label.as_bytes()])
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps test failures and log lines readable
        write!(f, "Address(0x{}..)", hex::encode(&self.0[..4]))
    }
}

impl FromStr for Address {
    type Err = SppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|_| SppError::InvalidAddress {
            reason: "address is not valid hex",
        })?;
        let id: [u8; 32] = bytes.try_into().map_err(|_| SppError::InvalidAddress {
            reason: "address must be 32 bytes",
        })?;
        Ok(Self(id))
    }
}

impl TryFrom<String> for Address {
    type Error = SppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

// ============ Health ============

/// Solvency ratio in 18-decimal fixed point; `1e18` is exactly solvent.
///
/// A position without debt has [`HealthFactor::MAX`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    BorshSerialize, BorshDeserialize,
)]
pub struct HealthFactor(pub u128);

impl HealthFactor {
    /// "Infinitely" solvent
    pub const MAX: HealthFactor = HealthFactor(u128::MAX);

    /// Minimum acceptable ratio
    pub const MIN: HealthFactor = HealthFactor(health::MIN_HEALTH_FACTOR);

    /// Returns true if the ratio meets the minimum
    pub fn is_healthy(&self) -> bool {
        *self >= Self::MIN
    }

    pub fn is_max(&self) -> bool {
        *self == Self::MAX
    }

    pub fn value(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for HealthFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_max() {
            return write!(f, "inf");
        }
        let whole = self.0 / precision::PRECISION;
        let frac = self.0 % precision::PRECISION;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let digits = format!("{:018}", frac);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

/// Per-position state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum PositionStatus {
    /// No outstanding debt
    Closed,
    /// Health factor at or above the minimum
    Solvent,
    /// Health factor below the minimum; eligible for liquidation
    Undercollateralized,
}

// ============ Collateral ============

/// An approved collateral asset and its authoritative price feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct CollateralConfig {
    /// Token identity of the asset
    pub asset: Address,
    /// Feed that reports the asset's USD price (8 decimals)
    pub price_feed: Address,
}

/// Read-only account summary, recomputed on every call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountInformation {
    /// Synthetic units minted by the user (18 decimals)
    pub total_minted: u128,
    /// USD value of all collateral (18 decimals)
    pub collateral_value_usd: u128,
}

// ============ Liquidation ============

/// Incentive paid to liquidators on top of the debt-equivalent collateral.
///
/// `Multiplier` is the literal formula `bonus = base * 10`, a 1000% bonus,
/// although the constant is named like a 10% incentive (what `Percent`
/// computes). Under `Multiplier` a liquidation can never both fit the
/// target's deposit and improve its health factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidationBonus {
    /// `bonus = base * LIQUIDATION_BONUS`
    #[default]
    Multiplier,
    /// `bonus = base * LIQUIDATION_BONUS / LIQUIDATION_PRECISION`
    Percent,
}

/// Result of a successful liquidation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationOutcome {
    /// Debt repaid on behalf of the target (18 decimals)
    pub debt_covered: u128,
    /// Collateral equivalent of the repaid debt
    pub base_collateral: u128,
    /// Bonus collateral on top of the base amount
    pub bonus_collateral: u128,
    /// Target health factor before the liquidation
    pub starting_health_factor: HealthFactor,
    /// Target health factor after the liquidation
    pub ending_health_factor: HealthFactor,
}

impl LiquidationOutcome {
    /// Total collateral moved from the target to the liquidator
    pub fn collateral_seized(&self) -> u128 {
        self.base_collateral.saturating_add(self.bonus_collateral)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_hex_roundtrip() {
        let address = Address::from_label("alice");
        let parsed: Address = address.to_string().parse().unwrap();
        assert_eq!(parsed, address);

        // Prefix is optional
        let bare = address.to_string().trim_start_matches("0x").to_string();
        assert_eq!(bare.parse::<Address>().unwrap(), address);
    }

    #[test]
    fn test_address_rejects_bad_input() {
        assert!(matches!("0x1234".parse::<Address>(), Err(SppError::InvalidAddress { .. })));
        assert!(matches!("zz".parse::<Address>(), Err(SppError::InvalidAddress { .. })));
    }

    #[test]
    fn test_labels_are_distinct() {
        assert_ne!(Address::from_label("alice"), Address::from_label("bob"));
        assert!(!Address::from_label("alice").is_zero());
        assert!(Address::ZERO.is_zero());
    }

    #[test]
    fn test_health_factor_display() {
        assert_eq!(HealthFactor(1_250_000_000_000_000_000).to_string(), "1.25");
        assert_eq!(HealthFactor(1_000_000_000_000_000_000).to_string(), "1");
        assert_eq!(HealthFactor::MAX.to_string(), "inf");
    }

    #[test]
    fn test_health_factor_threshold() {
        assert!(HealthFactor::MIN.is_healthy());
        assert!(HealthFactor::MAX.is_healthy());
        assert!(!HealthFactor(health::MIN_HEALTH_FACTOR - 1).is_healthy());
    }
}

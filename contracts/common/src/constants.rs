//! Protocol Constants
//!
//! All magic numbers of the SPP engine. None of them can be changed after
//! construction: there is no governance surface.
//!
//! Amounts of the synthetic unit and all USD values use 18-decimal fixed
//! point. Price feeds report 8-decimal answers which are up-scaled by
//! [`precision::ADDITIONAL_FEED_PRECISION`] before use.

/// Token Metadata for the synthetic unit
pub mod token {
    /// Token name
    pub const NAME: &str = "SPP Stablecoin";
    /// Token symbol
    pub const SYMBOL: &str = "SPP";
    /// Decimal places
    pub const DECIMALS: u8 = 18;
    /// One unit with decimals (1 SPP = 1e18 base units)
    pub const ONE: u128 = 1_000_000_000_000_000_000;
}

/// Fixed-point precision
pub mod precision {
    /// 18-decimal fixed point used for USD values and health factors
    pub const PRECISION: u128 = 1_000_000_000_000_000_000; // 1e18

    /// Scales an 8-decimal feed answer up to 18 decimals
    pub const ADDITIONAL_FEED_PRECISION: u128 = 10_000_000_000; // 1e10

    /// Decimals carried by feed answers
    pub const FEED_DECIMALS: u8 = 8;
}

/// Solvency policy
pub mod health {
    /// Percentage of collateral value that counts toward solvency (50 = 50%,
    /// i.e. positions must be 200% over-collateralized)
    pub const LIQUIDATION_THRESHOLD: u128 = 50;

    /// Denominator for percentages
    pub const LIQUIDATION_PRECISION: u128 = 100;

    /// Minimum acceptable health factor (1.0 in 18-decimal fixed point)
    pub const MIN_HEALTH_FACTOR: u128 = super::precision::PRECISION;
}

/// Liquidation incentive
pub mod liquidation {
    /// Bonus factor applied to the debt-equivalent collateral.
    ///
    /// Under `LiquidationBonus::Multiplier` the bonus is `base * 10`; under
    /// `LiquidationBonus::Percent` it is `base * 10 / 100`.
    pub const LIQUIDATION_BONUS: u128 = 10;
}

/// Price feed policy (applied by the feed registry, not by the engine)
pub mod oracle {
    /// Default maximum age of a feed answer before it is considered stale
    pub const DEFAULT_MAX_PRICE_AGE_SECS: u64 = 3 * 60 * 60;
}

/// Domain tags for derived identities
pub mod domain {
    /// Prefix hashed together with the synthetic authority to derive the
    /// engine's custody address
    pub const ENGINE_CUSTODY: &[u8] = b"spp-engine/custody/v1";

    /// Prefix for addresses derived from human-readable labels
    pub const LABEL: &[u8] = b"spp/label/v1";
}

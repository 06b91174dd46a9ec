//! Mathematical Utilities for the SPP engine
//!
//! Fixed-point valuation and health-factor formulas. Products of two
//! 18-decimal quantities exceed `u128`, so intermediates are widened to
//! `U256` and narrowed back with an explicit overflow check.

use ethereum_types::U256;

use crate::constants::{health, liquidation, precision};
use crate::errors::{SppError, SppResult};
use crate::types::{HealthFactor, LiquidationBonus};

/// USD value (18 decimals) of `amount` units of an asset priced at
/// `price` (8-decimal feed answer).
///
/// value = price * 1e10 * amount / 1e18
pub fn usd_value(price: u128, amount: u128) -> SppResult<u128> {
    let scaled_price = scale_price(price)?;
    let value = scaled_price
        .checked_mul(U256::from(amount))
        .ok_or(SppError::Overflow)?
        / U256::from(precision::PRECISION);
    narrow(value)
}

/// Amount of an asset priced at `price` (8-decimal feed answer) worth
/// `usd_amount` (18 decimals).
///
/// amount = usd_amount * 1e18 / (price * 1e10)
pub fn token_amount_from_usd(price: u128, usd_amount: u128) -> SppResult<u128> {
    let scaled_price = scale_price(price)?;
    if scaled_price.is_zero() {
        return Err(SppError::DivisionByZero);
    }
    let amount = U256::from(usd_amount)
        .checked_mul(U256::from(precision::PRECISION))
        .ok_or(SppError::Overflow)?
        / scaled_price;
    narrow(amount)
}

/// Health factor for a position
///
/// hf = (collateral_value * 50 / 100) * 1e18 / debt, or `MAX` without debt.
/// Ratios beyond `u128` saturate to `MAX`.
pub fn calculate_health_factor(total_minted: u128, collateral_value_usd: u128) -> HealthFactor {
    if total_minted == 0 {
        return HealthFactor::MAX;
    }

    let adjusted = U256::from(collateral_value_usd) * U256::from(health::LIQUIDATION_THRESHOLD)
        / U256::from(health::LIQUIDATION_PRECISION);
    // adjusted < 2^128 and PRECISION < 2^60, so the product fits in 256 bits
    let ratio = adjusted * U256::from(precision::PRECISION) / U256::from(total_minted);

    HealthFactor(narrow(ratio).unwrap_or(u128::MAX))
}

/// Bonus collateral owed to a liquidator for `base` debt-equivalent collateral
pub fn liquidation_bonus(base: u128, policy: LiquidationBonus) -> SppResult<u128> {
    match policy {
        LiquidationBonus::Multiplier => base
            .checked_mul(liquidation::LIQUIDATION_BONUS)
            .ok_or(SppError::Overflow),
        LiquidationBonus::Percent => {
            let bonus = U256::from(base) * U256::from(liquidation::LIQUIDATION_BONUS)
                / U256::from(health::LIQUIDATION_PRECISION);
            narrow(bonus)
        }
    }
}

/// Safe addition with overflow check
pub fn safe_add(a: u128, b: u128) -> SppResult<u128> {
    a.checked_add(b).ok_or(SppError::Overflow)
}

/// Safe subtraction with underflow check
pub fn safe_sub(a: u128, b: u128) -> SppResult<u128> {
    a.checked_sub(b).ok_or(SppError::Underflow)
}

/// 8-decimal feed answer scaled to 18 decimals
fn scale_price(price: u128) -> SppResult<U256> {
    U256::from(price)
        .checked_mul(U256::from(precision::ADDITIONAL_FEED_PRECISION))
        .ok_or(SppError::Overflow)
}

fn narrow(value: U256) -> SppResult<u128> {
    if value > U256::from(u128::MAX) {
        return Err(SppError::Overflow);
    }
    Ok(value.low_u128())
}

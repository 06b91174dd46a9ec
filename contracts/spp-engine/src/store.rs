//! Engine Store
//!
//! The deposit and debt tables, owned exclusively by the engine. Zero
//! entries are removed so that equal positions always compare equal.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};

use spp_common::{
    errors::{SppError, SppResult},
    math::{safe_add, safe_sub},
    types::Address,
};

/// `Deposit[user][asset]` and `MintedDebt[user]`
#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct EngineStore {
    deposits: BTreeMap<Address, BTreeMap<Address, u128>>,
    minted: BTreeMap<Address, u128>,
}

impl EngineStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ============ Collateral ============

    /// Deposited amount of `asset` held for `user`
    pub fn collateral_of(&self, user: &Address, asset: &Address) -> u128 {
        self.deposits
            .get(user)
            .and_then(|assets| assets.get(asset))
            .copied()
            .unwrap_or(0)
    }

    pub fn credit_collateral(&mut self, user: &Address, asset: &Address, amount: u128) -> SppResult<u128> {
        let balance = safe_add(self.collateral_of(user, asset), amount)?;
        if balance > 0 {
            self.deposits.entry(*user).or_default().insert(*asset, balance);
        }
        Ok(balance)
    }

    /// Decrease a deposit.
    ///
    /// # Errors
    /// - `InsufficientCollateral` if `amount` exceeds the deposit
    pub fn debit_collateral(&mut self, user: &Address, asset: &Address, amount: u128) -> SppResult<u128> {
        let available = self.collateral_of(user, asset);
        if available < amount {
            return Err(SppError::InsufficientCollateral {
                asset: *asset,
                available,
                requested: amount,
            });
        }
        let balance = safe_sub(available, amount)?;

        if let Some(assets) = self.deposits.get_mut(user) {
            if balance == 0 {
                assets.remove(asset);
            } else {
                assets.insert(*asset, balance);
            }
            if assets.is_empty() {
                self.deposits.remove(user);
            }
        }
        Ok(balance)
    }

    /// Sum of all users' deposits of `asset`
    pub fn total_collateral(&self, asset: &Address) -> SppResult<u128> {
        self.deposits
            .values()
            .filter_map(|assets| assets.get(asset))
            .try_fold(0u128, |total, amount| safe_add(total, *amount))
    }

    // ============ Debt ============

    /// Synthetic units minted by `user`
    pub fn minted_of(&self, user: &Address) -> u128 {
        self.minted.get(user).copied().unwrap_or(0)
    }

    pub fn add_debt(&mut self, user: &Address, amount: u128) -> SppResult<u128> {
        let debt = safe_add(self.minted_of(user), amount)?;
        if debt > 0 {
            self.minted.insert(*user, debt);
        }
        Ok(debt)
    }

    /// Decrease recorded debt.
    ///
    /// # Errors
    /// - `InsufficientDebt` if `amount` exceeds the recorded debt
    pub fn sub_debt(&mut self, user: &Address, amount: u128) -> SppResult<u128> {
        let available = self.minted_of(user);
        if available < amount {
            return Err(SppError::InsufficientDebt {
                available,
                requested: amount,
            });
        }
        let debt = safe_sub(available, amount)?;
        if debt == 0 {
            self.minted.remove(user);
        } else {
            self.minted.insert(*user, debt);
        }
        Ok(debt)
    }

    /// Sum of all users' debt
    pub fn total_debt(&self) -> SppResult<u128> {
        self.minted
            .values()
            .try_fold(0u128, |total, amount| safe_add(total, *amount))
    }

    /// Users with a deposit or debt
    pub fn users(&self) -> Vec<Address> {
        let mut users: Vec<Address> = self.deposits.keys().chain(self.minted.keys()).copied().collect();
        users.sort();
        users.dedup();
        users
    }

    pub fn is_empty(&self) -> bool {
        self.deposits.is_empty() && self.minted.is_empty()
    }

    // ============ Encoding ============

    pub fn to_bytes(&self) -> SppResult<Vec<u8>> {
        borsh::to_vec(self).map_err(|e| SppError::InvalidConfig {
            reason: format!("store encoding failed: {e}"),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> SppResult<Self> {
        Self::try_from_slice(bytes).map_err(|e| SppError::InvalidConfig {
            reason: format!("store decoding failed: {e}"),
        })
    }
}

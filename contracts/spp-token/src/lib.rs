//! SPP Token Ledger
//!
//! In-memory fungible-token ledger for the collateral assets and the SPP
//! synthetic unit. Only the registered owner of the synthetic token (the
//! engine) can mint or burn it.
//!
//! The ledger implements [`Journaled`], so every balance change made while
//! the engine runs an action is undone if that action fails.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::debug;

use spp_common::{
    constants::token,
    errors::{SppError, SppResult},
    host::{Journaled, SyntheticAuthority, TokenLedger},
    math::{safe_add, safe_sub},
    types::Address,
};

// ============ Token State ============

/// Balances, allowances and supply of one token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct TokenState {
    /// Balance per holder
    pub balances: BTreeMap<Address, u128>,
    /// Allowance per (owner, spender)
    pub allowances: BTreeMap<(Address, Address), u128>,
    /// Total supply
    pub total_supply: u128,
}

impl TokenState {
    pub fn balance_of(&self, holder: &Address) -> u128 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    fn debit(&mut self, holder: &Address, amount: u128) -> SppResult<()> {
        let available = self.balance_of(holder);
        if available < amount {
            return Err(SppError::InsufficientBalance {
                available,
                requested: amount,
            });
        }
        let remaining = safe_sub(available, amount)?;
        if remaining == 0 {
            self.balances.remove(holder);
        } else {
            self.balances.insert(*holder, remaining);
        }
        Ok(())
    }

    fn credit(&mut self, holder: &Address, amount: u128) -> SppResult<()> {
        if amount == 0 {
            return Ok(());
        }
        let balance = safe_add(self.balance_of(holder), amount)?;
        self.balances.insert(*holder, balance);
        Ok(())
    }

    fn spend_allowance(&mut self, owner: &Address, spender: &Address, amount: u128) -> SppResult<()> {
        let available = self.allowance(owner, spender);
        // Max allowance never decreases
        if available == u128::MAX {
            return Ok(());
        }
        if available < amount {
            return Err(SppError::InsufficientAllowance {
                available,
                requested: amount,
            });
        }
        self.allowances.insert((*owner, *spender), safe_sub(available, amount)?);
        Ok(())
    }
}

/// The synthetic token and the only account allowed to mint/burn it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct SyntheticToken {
    /// Token identity
    pub token: Address,
    /// Authorized minter (the engine's custody address)
    pub owner: Address,
}

// ============ Ledger ============

/// Token ledger with nested checkpoints
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    tokens: BTreeMap<Address, TokenState>,
    synthetic: Option<SyntheticToken>,
    journal: Vec<BTreeMap<Address, TokenState>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plain token (collateral asset)
    pub fn register_token(&mut self, token: Address) -> SppResult<()> {
        if token.is_zero() {
            return Err(SppError::InvalidAddress {
                reason: "token cannot be zero address",
            });
        }
        self.tokens.entry(token).or_default();
        Ok(())
    }

    /// Register the synthetic token with its authorized minter
    pub fn register_synthetic(&mut self, token: Address, owner: Address) -> SppResult<()> {
        if owner.is_zero() {
            return Err(SppError::InvalidAddress {
                reason: "synthetic owner cannot be zero address",
            });
        }
        self.register_token(token)?;
        self.synthetic = Some(SyntheticToken { token, owner });
        Ok(())
    }

    /// Create `amount` of a collateral token out of thin air (test faucet).
    ///
    /// The synthetic token can only be created through [`SyntheticAuthority::mint`].
    pub fn faucet(&mut self, token: &Address, to: &Address, amount: u128) -> SppResult<()> {
        if self.synthetic.map(|s| s.token) == Some(*token) {
            return Err(SppError::Unauthorized {
                expected: self.synthetic.map(|s| s.owner).unwrap_or_default(),
                actual: *to,
            });
        }
        let state = self.state_mut(token)?;
        state.credit(to, amount)?;
        state.total_supply = safe_add(state.total_supply, amount)?;
        Ok(())
    }

    /// Set the allowance of `spender` over `owner`'s tokens
    pub fn approve(&mut self, token: &Address, owner: &Address, spender: &Address, amount: u128) -> SppResult<()> {
        let state = self.state_mut(token)?;
        state.allowances.insert((*owner, *spender), amount);
        Ok(())
    }

    pub fn balance_of(&self, token: &Address, holder: &Address) -> u128 {
        self.tokens.get(token).map(|s| s.balance_of(holder)).unwrap_or(0)
    }

    pub fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> u128 {
        self.tokens
            .get(token)
            .map(|s| s.allowance(owner, spender))
            .unwrap_or(0)
    }

    pub fn total_supply(&self, token: &Address) -> u128 {
        self.tokens.get(token).map(|s| s.total_supply).unwrap_or(0)
    }

    pub fn synthetic(&self) -> Option<SyntheticToken> {
        self.synthetic
    }

    /// Read-only view of one token's state
    pub fn token_state(&self, token: &Address) -> Option<&TokenState> {
        self.tokens.get(token)
    }

    /// Number of open checkpoints
    pub fn depth(&self) -> usize {
        self.journal.len()
    }

    fn state_mut(&mut self, token: &Address) -> SppResult<&mut TokenState> {
        self.tokens
            .get_mut(token)
            .ok_or(SppError::UnknownToken { token: *token })
    }

    fn authorize(&self, caller: &Address) -> SppResult<SyntheticToken> {
        let synthetic = self.synthetic.ok_or(SppError::UnknownToken { token: Address::ZERO })?;
        if synthetic.owner != *caller {
            return Err(SppError::Unauthorized {
                expected: synthetic.owner,
                actual: *caller,
            });
        }
        Ok(synthetic)
    }

    fn move_balance(&mut self, token: &Address, from: &Address, to: &Address, amount: u128) -> SppResult<()> {
        if to.is_zero() {
            return Err(SppError::InvalidAddress {
                reason: "cannot transfer to zero address",
            });
        }
        let state = self.state_mut(token)?;
        state.debit(from, amount)?;
        state.credit(to, amount)?;
        Ok(())
    }
}

impl TokenLedger for Ledger {
    fn transfer_from(
        &mut self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> SppResult<bool> {
        // Check the balance before touching the allowance so a failed
        // transfer leaves both untouched
        let available = self.balance_of(token, from);
        if available < amount {
            return Err(SppError::InsufficientBalance {
                available,
                requested: amount,
            });
        }
        self.state_mut(token)?.spend_allowance(from, spender, amount)?;
        self.move_balance(token, from, to, amount)?;
        debug!(%token, %from, %to, amount, "transfer_from");
        Ok(true)
    }

    fn transfer(&mut self, token: &Address, sender: &Address, to: &Address, amount: u128) -> SppResult<bool> {
        self.move_balance(token, sender, to, amount)?;
        debug!(%token, from = %sender, %to, amount, "transfer");
        Ok(true)
    }
}

impl SyntheticAuthority for Ledger {
    fn mint(&mut self, minter: &Address, to: &Address, amount: u128) -> SppResult<bool> {
        let synthetic = self.authorize(minter)?;
        if amount == 0 {
            return Err(SppError::InvalidAmount);
        }
        if to.is_zero() {
            return Err(SppError::InvalidAddress {
                reason: "cannot mint to zero address",
            });
        }
        let state = self.state_mut(&synthetic.token)?;
        state.credit(to, amount)?;
        state.total_supply = safe_add(state.total_supply, amount)?;
        debug!(%to, amount, supply = state.total_supply, "synthetic minted");
        Ok(true)
    }

    fn burn(&mut self, burner: &Address, amount: u128) -> SppResult<()> {
        let synthetic = self.authorize(burner)?;
        if amount == 0 {
            return Err(SppError::InvalidAmount);
        }
        let state = self.state_mut(&synthetic.token)?;
        state.debit(burner, amount)?;
        state.total_supply = safe_sub(state.total_supply, amount)?;
        debug!(amount, supply = state.total_supply, "synthetic burned");
        Ok(())
    }
}

impl Journaled for Ledger {
    fn checkpoint(&mut self) {
        self.journal.push(self.tokens.clone());
    }

    fn commit(&mut self) {
        self.journal.pop();
    }

    fn revert(&mut self) {
        if let Some(saved) = self.journal.pop() {
            self.tokens = saved;
        }
    }
}

// ============ Helper Functions ============

/// Get token name
pub fn get_name() -> &'static str {
    token::NAME
}

/// Get token symbol
pub fn get_symbol() -> &'static str {
    token::SYMBOL
}

/// Get token decimals
pub fn get_decimals() -> u8 {
    token::DECIMALS
}

/// Split an amount into whole and fractional units
pub fn format_amount(amount: u128) -> (u128, u128) {
    let whole = amount / token::ONE;
    let fractional = amount % token::ONE;
    (whole, fractional)
}

// ============ Tests ============

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: u128 = token::ONE;

    fn weth() -> Address {
        Address::from_label("weth")
    }

    fn spp() -> Address {
        Address::from_label("spp")
    }

    fn engine() -> Address {
        Address::from_label("engine")
    }

    fn alice() -> Address {
        Address::from_label("alice")
    }

    fn bob() -> Address {
        Address::from_label("bob")
    }

    fn create_test_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.register_token(weth()).unwrap();
        ledger.register_synthetic(spp(), engine()).unwrap();
        ledger.faucet(&weth(), &alice(), 100 * ONE).unwrap();
        ledger
    }

    #[test]
    fn test_transfer_success() {
        let mut ledger = create_test_ledger();

        assert!(ledger.transfer(&weth(), &alice(), &bob(), 60 * ONE).unwrap());
        assert_eq!(ledger.balance_of(&weth(), &alice()), 40 * ONE);
        assert_eq!(ledger.balance_of(&weth(), &bob()), 60 * ONE);
        assert_eq!(ledger.total_supply(&weth()), 100 * ONE);
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let mut ledger = create_test_ledger();

        let result = ledger.transfer(&weth(), &bob(), &alice(), 1);
        assert!(matches!(result, Err(SppError::InsufficientBalance { .. })));
    }

    #[test]
    fn test_transfer_from_spends_allowance() {
        let mut ledger = create_test_ledger();
        ledger.approve(&weth(), &alice(), &engine(), 10 * ONE).unwrap();

        ledger.transfer_from(&weth(), &engine(), &alice(), &engine(), 4 * ONE).unwrap();
        assert_eq!(ledger.allowance(&weth(), &alice(), &engine()), 6 * ONE);

        let result = ledger.transfer_from(&weth(), &engine(), &alice(), &engine(), 7 * ONE);
        assert!(matches!(result, Err(SppError::InsufficientAllowance { .. })));
        assert_eq!(ledger.balance_of(&weth(), &engine()), 4 * ONE);
    }

    #[test]
    fn test_max_allowance_is_infinite() {
        let mut ledger = create_test_ledger();
        ledger.approve(&weth(), &alice(), &engine(), u128::MAX).unwrap();

        ledger.transfer_from(&weth(), &engine(), &alice(), &engine(), 50 * ONE).unwrap();
        assert_eq!(ledger.allowance(&weth(), &alice(), &engine()), u128::MAX);
    }

    #[test]
    fn test_unknown_token() {
        let mut ledger = create_test_ledger();
        let wbtc = Address::from_label("wbtc");

        let result = ledger.transfer(&wbtc, &alice(), &bob(), 1);
        assert_eq!(result, Err(SppError::UnknownToken { token: wbtc }));
    }

    #[test]
    fn test_mint_authorized() {
        let mut ledger = create_test_ledger();

        assert!(ledger.mint(&engine(), &alice(), 1_000 * ONE).unwrap());
        assert_eq!(ledger.balance_of(&spp(), &alice()), 1_000 * ONE);
        assert_eq!(ledger.total_supply(&spp()), 1_000 * ONE);
    }

    #[test]
    fn test_mint_unauthorized() {
        let mut ledger = create_test_ledger();

        let result = ledger.mint(&alice(), &alice(), 1_000 * ONE);
        assert!(matches!(result, Err(SppError::Unauthorized { .. })));
    }

    #[test]
    fn test_mint_rejects_zero_amount_and_recipient() {
        let mut ledger = create_test_ledger();

        assert_eq!(ledger.mint(&engine(), &alice(), 0), Err(SppError::InvalidAmount));
        assert!(matches!(
            ledger.mint(&engine(), &Address::ZERO, ONE),
            Err(SppError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_faucet_cannot_create_synthetic() {
        let mut ledger = create_test_ledger();

        let result = ledger.faucet(&spp(), &alice(), ONE);
        assert!(matches!(result, Err(SppError::Unauthorized { .. })));
    }

    #[test]
    fn test_burn_success() {
        let mut ledger = create_test_ledger();
        ledger.mint(&engine(), &engine(), 10 * ONE).unwrap();

        ledger.burn(&engine(), 4 * ONE).unwrap();
        assert_eq!(ledger.balance_of(&spp(), &engine()), 6 * ONE);
        assert_eq!(ledger.total_supply(&spp()), 6 * ONE);
    }

    #[test]
    fn test_burn_more_than_balance() {
        let mut ledger = create_test_ledger();
        ledger.mint(&engine(), &engine(), ONE).unwrap();

        let result = ledger.burn(&engine(), 2 * ONE);
        assert!(matches!(result, Err(SppError::InsufficientBalance { .. })));
    }

    #[test]
    fn test_revert_restores_balances() {
        let mut ledger = create_test_ledger();

        ledger.checkpoint();
        ledger.transfer(&weth(), &alice(), &bob(), 30 * ONE).unwrap();
        ledger.mint(&engine(), &bob(), ONE).unwrap();
        ledger.revert();

        assert_eq!(ledger.balance_of(&weth(), &alice()), 100 * ONE);
        assert_eq!(ledger.balance_of(&weth(), &bob()), 0);
        assert_eq!(ledger.total_supply(&spp()), 0);
        assert_eq!(ledger.depth(), 0);
    }

    #[test]
    fn test_nested_checkpoints() {
        let mut ledger = create_test_ledger();

        ledger.checkpoint();
        ledger.transfer(&weth(), &alice(), &bob(), 10 * ONE).unwrap();
        ledger.checkpoint();
        ledger.transfer(&weth(), &alice(), &bob(), 10 * ONE).unwrap();
        ledger.revert();
        ledger.commit();

        assert_eq!(ledger.balance_of(&weth(), &bob()), 10 * ONE);
        assert_eq!(ledger.depth(), 0);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(ONE + 5), (1, 5));
        assert_eq!(get_symbol(), "SPP");
        assert_eq!(get_decimals(), 18);
    }
}

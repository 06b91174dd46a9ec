//! Collaborator interfaces
//!
//! The engine owns only its own ledger. Token balances, price feeds and the
//! synthetic authority live behind these traits. A `Host` bundles all of
//! them and must be [`Journaled`] so that the engine can undo external
//! effects of an action that fails part way through.
//!
//! Collaborators signal a refusal with `Ok(false)` and an abort with `Err`.

use crate::errors::SppResult;
use crate::types::Address;

/// Fungible-token ledger for collateral assets and the synthetic unit
pub trait TokenLedger {
    /// Move `amount` of `token` from `from` to `to` using the allowance
    /// `from` granted to `spender`
    fn transfer_from(
        &mut self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> SppResult<bool>;

    /// Move `amount` of `token` from `sender` to `to`
    fn transfer(&mut self, token: &Address, sender: &Address, to: &Address, amount: u128) -> SppResult<bool>;
}

/// Source of USD prices
pub trait PriceFeed {
    /// Latest answer of `feed` in 8-decimal fixed point
    fn latest_price(&self, feed: &Address) -> SppResult<i128>;
}

/// Mint/burn authority of the synthetic unit
pub trait SyntheticAuthority {
    /// Create `amount` units for `to`; only `minter` == owner may call
    fn mint(&mut self, minter: &Address, to: &Address, amount: u128) -> SppResult<bool>;

    /// Destroy `amount` units held by `burner`; only the owner may call
    fn burn(&mut self, burner: &Address, amount: u128) -> SppResult<()>;
}

/// Checkpoint/commit/revert over external state.
///
/// Checkpoints nest; every `checkpoint` is closed by exactly one `commit`
/// or `revert`.
pub trait Journaled {
    fn checkpoint(&mut self);
    fn commit(&mut self);
    fn revert(&mut self);
}

/// Everything the engine talks to
pub trait Host: TokenLedger + PriceFeed + SyntheticAuthority + Journaled {}

impl<T> Host for T where T: TokenLedger + PriceFeed + SyntheticAuthority + Journaled {}

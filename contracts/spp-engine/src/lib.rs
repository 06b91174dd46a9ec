//! SPP Engine - Collateralized-Debt Engine
//!
//! Users lock approved collateral assets and mint the SPP synthetic dollar
//! against them. Only half of the collateral's USD value counts toward
//! solvency, so every position must stay at least 200% collateralized.
//! Positions whose health factor drops below 1.0 can be liquidated by
//! anyone who repays part of the debt.
//!
//! ## Core Operations
//!
//! - **deposit_collateral**: lock an approved asset
//! - **mint_spp**: mint SPP against deposited collateral
//! - **deposit_collateral_and_mint_spp**: both in one action
//! - **redeem_collateral**: withdraw collateral
//! - **burn_spp**: repay debt
//! - **redeem_collateral_for_spp**: repay debt and withdraw in one action
//! - **liquidate**: repay an unhealthy user's debt and seize their collateral
//!
//! ## Execution Model
//!
//! The engine owns only its deposit and debt tables. Token movements, price
//! reads and SPP mint/burn go through a [`Host`](spp_common::host::Host).
//! Every action is all-or-nothing: if any step fails, the tables, the event
//! log and the host are rolled back. An action started while another one is
//! still running (e.g. from a token callback) fails with `ReentrantCall`.

pub mod actions;
pub mod engine;
pub mod guard;
pub mod store;

#[cfg(test)]
mod testing;

pub use engine::SppEngine;
pub use guard::ReentrancyGuard;
pub use store::EngineStore;

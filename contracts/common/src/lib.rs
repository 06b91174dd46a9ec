//! SPP Common Library
//!
//! Shared types, constants, math and collaborator interfaces for the SPP
//! collateralized-debt engine.
//!
//! Users lock approved collateral, mint the SPP synthetic dollar against it,
//! and every position must stay at least 200% collateralized. Undercollateralized
//! positions can be liquidated by anyone.
//!
//! ## Modules
//!
//! - **constants**: fixed protocol parameters (threshold, precision, bonus)
//! - **errors**: the `SppError` taxonomy
//! - **types**: `Address`, `HealthFactor`, account and liquidation records
//! - **math**: USD valuation and health factor in 18-decimal fixed point
//! - **events**: notifications consumed by indexers
//! - **config**: construction-time engine configuration
//! - **host**: traits for the token ledger, price feeds and synthetic authority

pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod host;
pub mod math;
pub mod types;


// Re-exports for convenience
pub use config::EngineConfig;
pub use errors::{SppError, SppResult};
pub use events::{EventLog, EventType, SppEvent};
pub use host::{Host, Journaled, PriceFeed, SyntheticAuthority, TokenLedger};
pub use types::{
    AccountInformation, Address, CollateralConfig, HealthFactor, LiquidationBonus,
    LiquidationOutcome, PositionStatus,
};

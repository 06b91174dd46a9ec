//! Error Types for the SPP engine
//!
//! Every error rejects the whole in-flight action. Nothing is retried
//! internally; the caller may resubmit.

use thiserror::Error;

use crate::types::{Address, HealthFactor};

/// Result type alias for SPP operations
pub type SppResult<T> = Result<T, SppError>;

/// Main error enum for all SPP errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SppError {
    // ============ Input Errors ============
    /// Zero amount on a quantity-bearing action
    #[error("amount must be greater than zero")]
    InvalidAmount,

    /// Collateral asset is not in the approved set
    #[error("collateral asset {asset} is not approved")]
    AssetNotApproved { asset: Address },

    /// Address that must be non-zero was zero
    #[error("invalid address: {reason}")]
    InvalidAddress { reason: &'static str },

    // ============ Configuration Errors ============
    /// Asset and price feed lists differ in length
    #[error("{assets} collateral assets but {price_feeds} price feeds")]
    ConfigurationMismatch { assets: usize, price_feeds: usize },

    /// The same collateral asset was listed twice
    #[error("collateral asset {asset} listed more than once")]
    DuplicateCollateral { asset: Address },

    /// Configuration could not be parsed
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // ============ Collaborator Errors ============
    /// Token movement refused or aborted
    #[error("transfer of {amount} {asset} from {from} to {to} failed")]
    TransferFailure {
        asset: Address,
        from: Address,
        to: Address,
        amount: u128,
    },

    /// Synthetic authority refused to mint
    #[error("minting {amount} SPP to {to} failed")]
    MintFailure { to: Address, amount: u128 },

    /// Feed reported a zero or negative answer
    #[error("price feed {feed} reported non-positive price {price}")]
    InvalidPrice { feed: Address, price: i128 },

    /// Feed answer is older than the configured maximum age
    #[error("price feed {feed} is stale: updated at {updated_at}, now {now}, max age {max_age}s")]
    StalePrice {
        feed: Address,
        updated_at: u64,
        now: u64,
        max_age: u64,
    },

    /// Feed is unknown to the registry
    #[error("price feed {feed} not found")]
    FeedNotFound { feed: Address },

    /// Token is unknown to the ledger
    #[error("token {token} is not registered")]
    UnknownToken { token: Address },

    /// Caller is not authorized for this operation
    #[error("unauthorized: expected {expected}, got {actual}")]
    Unauthorized { expected: Address, actual: Address },

    /// Token balance too low
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance { available: u128, requested: u128 },

    /// Token allowance too low
    #[error("insufficient allowance: available {available}, requested {requested}")]
    InsufficientAllowance { available: u128, requested: u128 },

    // ============ Solvency Errors ============
    /// Action would leave the acting user below the minimum health factor
    #[error("health factor {health_factor} is below the minimum")]
    SolvencyViolation { health_factor: HealthFactor },

    /// Liquidation target is solvent
    #[error("health factor {health_factor} is ok, position cannot be liquidated")]
    LiquidationNotEligible { health_factor: HealthFactor },

    /// Liquidation made the target's position worse
    #[error("liquidation did not improve health factor ({starting} -> {ending})")]
    LiquidationIneffective {
        starting: HealthFactor,
        ending: HealthFactor,
    },

    /// Redeeming more collateral than deposited
    #[error("insufficient collateral of {asset}: deposited {available}, requested {requested}")]
    InsufficientCollateral {
        asset: Address,
        available: u128,
        requested: u128,
    },

    /// Burning more debt than recorded
    #[error("insufficient debt: minted {available}, requested {requested}")]
    InsufficientDebt { available: u128, requested: u128 },

    // ============ Execution Errors ============
    /// A state-mutating action was invoked while another one was running
    #[error("re-entrant call rejected")]
    ReentrantCall,

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    #[error("arithmetic overflow")]
    Overflow,

    /// Arithmetic underflow occurred
    #[error("arithmetic underflow")]
    Underflow,

    /// Division by zero
    #[error("division by zero")]
    DivisionByZero,
}

impl SppError {
    /// Returns a stable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAmount => "E001_INVALID_AMOUNT",
            Self::AssetNotApproved { .. } => "E002_ASSET_NOT_APPROVED",
            Self::InvalidAddress { .. } => "E003_INVALID_ADDRESS",
            Self::ConfigurationMismatch { .. } => "E010_CONFIG_MISMATCH",
            Self::DuplicateCollateral { .. } => "E011_DUPLICATE_COLLATERAL",
            Self::InvalidConfig { .. } => "E012_INVALID_CONFIG",
            Self::TransferFailure { .. } => "E020_TRANSFER_FAILED",
            Self::MintFailure { .. } => "E021_MINT_FAILED",
            Self::InvalidPrice { .. } => "E022_INVALID_PRICE",
            Self::StalePrice { .. } => "E023_STALE_PRICE",
            Self::FeedNotFound { .. } => "E024_FEED_NOT_FOUND",
            Self::UnknownToken { .. } => "E025_UNKNOWN_TOKEN",
            Self::Unauthorized { .. } => "E026_UNAUTHORIZED",
            Self::InsufficientBalance { .. } => "E027_INSUFFICIENT_BALANCE",
            Self::InsufficientAllowance { .. } => "E028_INSUFFICIENT_ALLOWANCE",
            Self::SolvencyViolation { .. } => "E030_HEALTH_FACTOR_BROKEN",
            Self::LiquidationNotEligible { .. } => "E031_HEALTH_FACTOR_OK",
            Self::LiquidationIneffective { .. } => "E032_HEALTH_FACTOR_NOT_IMPROVED",
            Self::InsufficientCollateral { .. } => "E033_INSUFFICIENT_COLLATERAL",
            Self::InsufficientDebt { .. } => "E034_INSUFFICIENT_DEBT",
            Self::ReentrantCall => "E040_REENTRANT_CALL",
            Self::Overflow => "E080_OVERFLOW",
            Self::Underflow => "E081_UNDERFLOW",
            Self::DivisionByZero => "E082_DIV_ZERO",
        }
    }

    /// True for errors that indicate a broken internal invariant rather
    /// than a rejected user request
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::Overflow | Self::Underflow | Self::DivisionByZero)
    }
}

//! Price Feed Registry
//!
//! USD price feeds for the SPP engine's collateral assets. Each feed holds
//! one 8-decimal answer that only its operator can update, in the style of
//! an aggregator round.
//!
//! The engine itself never checks freshness. A registry built with
//! [`FeedRegistry::with_max_price_age`] refuses to serve answers older than
//! that age.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use spp_common::{
    constants::{oracle::DEFAULT_MAX_PRICE_AGE_SECS, precision::FEED_DECIMALS},
    errors::{SppError, SppResult},
    events::{EventLog, SppEvent},
    host::PriceFeed,
    types::Address,
};

// ============ Feed State ============

/// State of a single price feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct FeedState {
    /// Latest answer (8 decimals)
    pub answer: i128,
    /// Decimals of `answer`
    pub decimals: u8,
    /// Incremented on every update
    pub round_id: u64,
    /// Time of the latest update (seconds)
    pub updated_at: u64,
    /// Authorized operator (can update the answer)
    pub operator: Address,
}

/// Snapshot of the latest round of a feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundData {
    pub round_id: u64,
    pub answer: i128,
    pub updated_at: u64,
}

// ============ Registry ============

/// Collection of price feeds sharing one clock
#[derive(Debug, Clone, Default)]
pub struct FeedRegistry {
    feeds: BTreeMap<Address, FeedState>,
    now: u64,
    max_price_age: Option<u64>,
    events: EventLog,
}

impl FeedRegistry {
    /// Registry without a freshness policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse answers older than `secs`
    pub fn with_max_price_age(mut self, secs: u64) -> Self {
        self.max_price_age = Some(secs);
        self
    }

    /// Refuse answers older than three hours
    pub fn with_default_max_price_age(self) -> Self {
        self.with_max_price_age(DEFAULT_MAX_PRICE_AGE_SECS)
    }

    /// Create a feed with an initial answer at the current time
    pub fn add_feed(&mut self, feed: Address, operator: Address, answer: i128) -> SppResult<()> {
        if feed.is_zero() {
            return Err(SppError::InvalidAddress {
                reason: "feed cannot be zero address",
            });
        }
        if operator.is_zero() {
            return Err(SppError::InvalidAddress {
                reason: "operator cannot be zero address",
            });
        }

        self.feeds.insert(
            feed,
            FeedState {
                answer,
                decimals: FEED_DECIMALS,
                round_id: 1,
                updated_at: self.now,
                operator,
            },
        );
        info!(%feed, %operator, answer, "price feed added");
        Ok(())
    }

    /// Publish a new answer
    ///
    /// # Errors
    /// - `FeedNotFound` if the feed does not exist
    /// - `Unauthorized` if `signer` is not the feed's operator
    pub fn update_answer(&mut self, signer: &Address, feed: &Address, answer: i128) -> SppResult<()> {
        let now = self.now;
        let state = self
            .feeds
            .get_mut(feed)
            .ok_or(SppError::FeedNotFound { feed: *feed })?;

        // 1. Only operator can update the answer
        if *signer != state.operator {
            return Err(SppError::Unauthorized {
                expected: state.operator,
                actual: *signer,
            });
        }

        // 2. Record the new round
        let old_price = state.answer;
        state.answer = answer;
        state.round_id = state.round_id.saturating_add(1);
        state.updated_at = now;

        // 3. Emit event
        self.events.emit(SppEvent::PriceUpdated {
            feed: *feed,
            old_price,
            new_price: answer,
            updated_at: now,
        });
        debug!(%feed, old_price, new_price = answer, "price updated");

        Ok(())
    }

    /// Hand the feed over to a new operator
    pub fn set_operator(&mut self, signer: &Address, feed: &Address, new_operator: Address) -> SppResult<()> {
        if new_operator.is_zero() {
            return Err(SppError::InvalidAddress {
                reason: "operator cannot be zero address",
            });
        }
        let state = self
            .feeds
            .get_mut(feed)
            .ok_or(SppError::FeedNotFound { feed: *feed })?;
        if *signer != state.operator {
            return Err(SppError::Unauthorized {
                expected: state.operator,
                actual: *signer,
            });
        }
        state.operator = new_operator;
        info!(%feed, operator = %new_operator, "feed operator changed");
        Ok(())
    }

    /// Latest round of a feed, ignoring the freshness policy
    pub fn latest_round(&self, feed: &Address) -> SppResult<RoundData> {
        let state = self.feed(feed)?;
        Ok(RoundData {
            round_id: state.round_id,
            answer: state.answer,
            updated_at: state.updated_at,
        })
    }

    /// Latest answer and whether it is stale, for display only
    pub fn price_for_display(&self, feed: &Address) -> SppResult<(i128, bool)> {
        let state = self.feed(feed)?;
        Ok((state.answer, self.is_stale(state)))
    }

    pub fn feed(&self, feed: &Address) -> SppResult<&FeedState> {
        self.feeds.get(feed).ok_or(SppError::FeedNotFound { feed: *feed })
    }

    // ============ Clock ============

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn set_time(&mut self, now: u64) {
        self.now = now;
    }

    pub fn advance_time(&mut self, secs: u64) {
        self.now = self.now.saturating_add(secs);
    }

    pub fn max_price_age(&self) -> Option<u64> {
        self.max_price_age
    }

    // ============ Events ============

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<SppEvent> {
        self.events.drain()
    }

    fn is_stale(&self, state: &FeedState) -> bool {
        match self.max_price_age {
            Some(max_age) => self.now.saturating_sub(state.updated_at) > max_age,
            None => false,
        }
    }
}

impl PriceFeed for FeedRegistry {
    fn latest_price(&self, feed: &Address) -> SppResult<i128> {
        let state = self.feed(feed)?;
        if self.is_stale(state) {
            return Err(SppError::StalePrice {
                feed: *feed,
                updated_at: state.updated_at,
                now: self.now,
                max_age: self.max_price_age.unwrap_or_default(),
            });
        }
        Ok(state.answer)
    }
}

// ============ Helper Functions ============

/// Convert an answer between decimal precisions, truncating when scaling down
pub fn convert_price_decimals(price: i128, from_decimals: u8, to_decimals: u8) -> SppResult<i128> {
    if from_decimals == to_decimals {
        return Ok(price);
    }

    if from_decimals > to_decimals {
        let divisor = 10i128
            .checked_pow(u32::from(from_decimals - to_decimals))
            .ok_or(SppError::Overflow)?;
        Ok(price / divisor)
    } else {
        let multiplier = 10i128
            .checked_pow(u32::from(to_decimals - from_decimals))
            .ok_or(SppError::Overflow)?;
        price.checked_mul(multiplier).ok_or(SppError::Overflow)
    }
}

// ============ Tests ============

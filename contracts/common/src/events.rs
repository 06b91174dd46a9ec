//! Protocol Events for SPP
//!
//! Events are emitted during action execution and consumed by off-chain
//! indexers. Events of an action that is reverted are discarded together
//! with the rest of its effects.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::errors::{SppError, SppResult};
use crate::types::Address;

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Collateral Events (0x01 - 0x1F)
    CollateralDeposited = 0x01,
    CollateralRedeemed = 0x02,

    // Debt Events (0x20 - 0x3F)
    SppMinted = 0x20,
    SppBurned = 0x21,
    Liquidation = 0x22,

    // Oracle Events (0x60 - 0x7F)
    PriceUpdated = 0x60,
}

/// Main event enum containing all possible protocol events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum SppEvent {
    /// Collateral credited to a user; emitted before the pull transfer
    CollateralDeposited {
        user: Address,
        asset: Address,
        amount: u128,
    },

    /// Collateral debited from `from` and sent to `to`; emitted before the
    /// push transfer
    CollateralRedeemed {
        from: Address,
        to: Address,
        asset: Address,
        amount: u128,
    },

    /// Debt recorded and synthetic units minted to the user
    SppMinted { user: Address, amount: u128 },

    /// Debt of `on_behalf_of` repaid with units pulled from `payer`
    SppBurned {
        on_behalf_of: Address,
        payer: Address,
        amount: u128,
    },

    /// Position liquidated
    Liquidation {
        liquidator: Address,
        user: Address,
        asset: Address,
        debt_covered: u128,
        collateral_seized: u128,
        bonus_collateral: u128,
    },

    /// Feed answer changed
    PriceUpdated {
        feed: Address,
        old_price: i128,
        new_price: i128,
        updated_at: u64,
    },
}

impl SppEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::CollateralDeposited { .. } => EventType::CollateralDeposited,
            Self::CollateralRedeemed { .. } => EventType::CollateralRedeemed,
            Self::SppMinted { .. } => EventType::SppMinted,
            Self::SppBurned { .. } => EventType::SppBurned,
            Self::Liquidation { .. } => EventType::Liquidation,
            Self::PriceUpdated { .. } => EventType::PriceUpdated,
        }
    }

    /// Borsh encoding handed to indexers
    pub fn to_bytes(&self) -> SppResult<Vec<u8>> {
        borsh::to_vec(self).map_err(|e| SppError::InvalidConfig {
            reason: format!("event encoding failed: {e}"),
        })
    }
}

/// Append-only event log with rollback to a mark
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<SppEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: SppEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[SppEvent] {
        &self.events
    }

    /// Take ownership of all events, leaving the log empty
    pub fn drain(&mut self) -> Vec<SppEvent> {
        core::mem::take(&mut self.events)
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&SppEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Current position, usable with [`EventLog::rollback_to`]
    pub fn mark(&self) -> usize {
        self.events.len()
    }

    /// Discard every event emitted after `mark`
    pub fn rollback_to(&mut self, mark: usize) {
        self.events.truncate(mark);
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_rollback() {
        let user = Address::from_label("alice");
        let asset = Address::from_label("weth");
        let mut log = EventLog::new();

        log.emit(SppEvent::CollateralDeposited { user, asset, amount: 10 });
        let mark = log.mark();
        log.emit(SppEvent::SppMinted { user, amount: 5 });
        assert_eq!(log.len(), 2);

        log.rollback_to(mark);
        assert_eq!(log.len(), 1);
        assert_eq!(log.filter_by_type(EventType::CollateralDeposited).len(), 1);
        assert!(log.filter_by_type(EventType::SppMinted).is_empty());
    }

    #[test]
    fn test_event_encoding_is_decodable() {
        let event = SppEvent::CollateralRedeemed {
            from: Address::from_label("alice"),
            to: Address::from_label("bob"),
            asset: Address::from_label("wbtc"),
            amount: 42,
        };
        let decoded = SppEvent::try_from_slice(&event.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, event);
    }
}

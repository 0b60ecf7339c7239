//! Escrow offer record
//!
//! An offer is written once at creation and destroyed when it is settled or
//! refunded. Terminal states exist so callers and events can name the outcome;
//! a persisted record is always `Open`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::address::Address;
use crate::ids::OfferId;

/// Offer lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferState {
    /// Deposit locked in the vault, awaiting a taker or a refund
    Open,
    /// Swapped with a taker (terminal)
    Settled,
    /// Deposit returned to the maker (terminal)
    Refunded,
}

impl OfferState {
    /// Check if the state is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(self, OfferState::Settled | OfferState::Refunded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OfferState::Open => "OPEN",
            OfferState::Settled => "SETTLED",
            OfferState::Refunded => "REFUNDED",
        }
    }
}

impl fmt::Display for OfferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The escrow record, keyed by `(maker, offer_id)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub maker: Address,
    pub offer_id: OfferId,
    pub deposit_mint: Address,
    pub receive_mint: Address,
    /// Exact quantity of `deposit_mint` locked in the vault
    pub deposit_amount: u64,
    /// Exact quantity of `receive_mint` a taker must pay
    pub receive_amount: u64,
    pub vault_address: Address,
    /// Collision-avoidance counter found when the vault address was derived
    pub derivation_bump: u8,
    pub state: OfferState,
    /// Ledger timestamp (unix millis) of the creating instruction
    pub created_at: i64,
}

impl Offer {
    /// Global key of the offer
    pub fn key(&self) -> (Address, OfferId) {
        (self.maker, self.offer_id)
    }

    pub fn is_open(&self) -> bool {
        self.state == OfferState::Open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_offer() -> Offer {
        Offer {
            maker: Address::new([1; 32]),
            offer_id: OfferId::new(2222),
            deposit_mint: Address::new([2; 32]),
            receive_mint: Address::new([3; 32]),
            deposit_amount: 1_000_000_000,
            receive_amount: 500_000_000,
            vault_address: Address::new([4; 32]),
            derivation_bump: 254,
            state: OfferState::Open,
            created_at: 1_708_123_456_789,
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(!OfferState::Open.is_terminal());
        assert!(OfferState::Settled.is_terminal());
        assert!(OfferState::Refunded.is_terminal());
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&OfferState::Refunded).unwrap();
        assert_eq!(json, "\"REFUNDED\"");
    }

    #[test]
    fn test_offer_serialization() {
        let offer = sample_offer();
        let json = serde_json::to_string(&offer).unwrap();
        let deser: Offer = serde_json::from_str(&json).unwrap();
        assert_eq!(offer, deser);
    }

    #[test]
    fn test_offer_key() {
        let offer = sample_offer();
        assert_eq!(offer.key(), (Address::new([1; 32]), OfferId::new(2222)));
        assert!(offer.is_open());
    }
}

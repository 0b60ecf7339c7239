//! Escrow events
//!
//! Immutable records emitted by successful transitions. Amounts are carried
//! both in base units and scaled by the mint's decimals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use themis_types::address::Address;
use themis_types::ids::OfferId;

/// Offer created and deposit locked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferMade {
    pub maker: Address,
    pub offer_id: OfferId,
    pub vault: Address,
    pub deposit_mint: Address,
    pub receive_mint: Address,
    pub deposit_amount: u64,
    pub receive_amount: u64,
    pub deposit_ui_amount: Decimal,
    pub receive_ui_amount: Decimal,
}

/// Offer settled with a taker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferTaken {
    pub maker: Address,
    pub taker: Address,
    pub offer_id: OfferId,
    pub deposit_mint: Address,
    pub receive_mint: Address,
    pub deposit_amount: u64,
    pub receive_amount: u64,
    pub deposit_ui_amount: Decimal,
    pub receive_ui_amount: Decimal,
}

/// Deposit returned to the maker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferRefunded {
    pub maker: Address,
    pub offer_id: OfferId,
    pub deposit_mint: Address,
    pub refunded_amount: u64,
    pub refunded_ui_amount: Decimal,
}

/// Enum wrapper for all escrow events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowEvent {
    OfferMade(OfferMade),
    OfferTaken(OfferTaken),
    OfferRefunded(OfferRefunded),
}

impl EscrowEvent {
    /// Key of the offer the event concerns
    pub fn offer_key(&self) -> (Address, OfferId) {
        match self {
            EscrowEvent::OfferMade(e) => (e.maker, e.offer_id),
            EscrowEvent::OfferTaken(e) => (e.maker, e.offer_id),
            EscrowEvent::OfferRefunded(e) => (e.maker, e.offer_id),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EscrowEvent::OfferMade(_) => "offer_made",
            EscrowEvent::OfferTaken(_) => "offer_taken",
            EscrowEvent::OfferRefunded(_) => "offer_refunded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offer_made_serialization() {
        let event = OfferMade {
            maker: Address::new([1; 32]),
            offer_id: OfferId::new(1111),
            vault: Address::new([2; 32]),
            deposit_mint: Address::new([3; 32]),
            receive_mint: Address::new([4; 32]),
            deposit_amount: 1_000_000_000,
            receive_amount: 500_000_000,
            deposit_ui_amount: Decimal::new(1000, 0),
            receive_ui_amount: Decimal::new(500, 0),
        };
        let json = serde_json::to_string(&event).unwrap();
        let deser: OfferMade = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deser);
    }

    #[test]
    fn test_event_enum_accessors() {
        let event = EscrowEvent::OfferRefunded(OfferRefunded {
            maker: Address::new([1; 32]),
            offer_id: OfferId::new(9),
            deposit_mint: Address::new([3; 32]),
            refunded_amount: 5,
            refunded_ui_amount: Decimal::new(5, 6),
        });
        assert_eq!(event.label(), "offer_refunded");
        assert_eq!(event.offer_key(), (Address::new([1; 32]), OfferId::new(9)));
    }

    #[test]
    fn test_ui_amount_serialized_as_string() {
        let event = OfferRefunded {
            maker: Address::new([1; 32]),
            offer_id: OfferId::new(9),
            deposit_mint: Address::new([3; 32]),
            refunded_amount: 2_500_000,
            refunded_ui_amount: Decimal::new(25, 1),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["refunded_ui_amount"], "2.5");
    }
}

//! Escrow configuration
//!
//! The program id seeds every derived address, so two deployments with
//! different ids never share vault or record addresses.

use serde::{Deserialize, Serialize};
use themis_types::address::Address;

/// Default program id of the escrow deployment
pub const DEFAULT_PROGRAM_ID: Address = Address::new(*b"themis_escrow_program_0000000001");

/// Existence reservation for an offer record, in native units
pub const DEFAULT_OFFER_RESERVE: u64 = 1_733_040;

/// Existence reservation for a holding account, in native units
pub const DEFAULT_HOLDING_RESERVE: u64 = 2_039_280;

/// Escrow protocol configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscrowConfig {
    /// Program id mixed into every derived address
    pub program_id: Address,
    /// Reservation the maker pays for the offer record
    pub offer_reserve: u64,
    /// Reservation paid for each holding account (vaults included)
    pub holding_reserve: u64,
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            program_id: DEFAULT_PROGRAM_ID,
            offer_reserve: DEFAULT_OFFER_RESERVE,
            holding_reserve: DEFAULT_HOLDING_RESERVE,
        }
    }
}

impl EscrowConfig {
    /// Load a configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Total reservation a maker pays to open one offer
    pub fn make_cost(&self) -> u64 {
        self.offer_reserve.saturating_add(self.holding_reserve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EscrowConfig::default();
        assert_eq!(config.program_id, DEFAULT_PROGRAM_ID);
        assert_eq!(config.make_cost(), DEFAULT_OFFER_RESERVE + DEFAULT_HOLDING_RESERVE);
    }

    #[test]
    fn test_from_json_partial() {
        let config = EscrowConfig::from_json(r#"{ "offer_reserve": 10 }"#).unwrap();
        assert_eq!(config.offer_reserve, 10);
        assert_eq!(config.holding_reserve, DEFAULT_HOLDING_RESERVE);
        assert_eq!(config.program_id, DEFAULT_PROGRAM_ID);
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        assert!(EscrowConfig::from_json("{ not json").is_err());
    }
}

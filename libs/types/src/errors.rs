//! Error types for parsing and validating shared types

use thiserror::Error;

/// Errors raised while constructing shared types from untrusted input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("Invalid address: {reason}")]
    InvalidAddress { reason: String },

    #[error("Invalid mint decimals: {decimals} exceeds maximum {max}")]
    InvalidDecimals { decimals: u8, max: u8 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_decimals_display() {
        let err = TypeError::InvalidDecimals {
            decimals: 40,
            max: 18,
        };
        assert_eq!(err.to_string(), "Invalid mint decimals: 40 exceeds maximum 18");
    }
}

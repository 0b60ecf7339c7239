//! Ledger addresses
//!
//! Every account on the ledger lives at a 32-byte address. Participant
//! addresses are Ed25519 public keys; program-derived addresses are SHA-256
//! digests chosen to fall off the curve, so no private key exists for them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::TypeError;

/// Length of an address in bytes
pub const ADDRESS_LEN: usize = 32;

/// A 32-byte ledger address
///
/// Displayed, parsed and serialized as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// Create an address from raw bytes
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Create a random address, useful for mints and fixtures
    pub fn new_unique() -> Self {
        Self(rand::random())
    }

    /// Borrow the raw bytes
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Copy out the raw bytes
    pub fn to_bytes(self) -> [u8; ADDRESS_LEN] {
        self.0
    }

    /// First 8 hex characters, for log lines
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.short())
    }
}

impl FromStr for Address {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidAddress {
            reason: e.to_string(),
        })?;
        let bytes: [u8; ADDRESS_LEN] =
            bytes
                .try_into()
                .map_err(|b: Vec<u8>| TypeError::InvalidAddress {
                    reason: format!("expected {} bytes, got {}", ADDRESS_LEN, b.len()),
                })?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

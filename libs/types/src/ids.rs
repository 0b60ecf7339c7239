//! Identifier types for escrow entities
//!
//! Offer ids are maker-chosen 64-bit integers; uniqueness is scoped per maker
//! and is the caller's responsibility. Transaction ids use UUID v7 so ledger
//! receipts sort chronologically.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maker-scoped offer identifier
///
/// Combined with the maker's address it forms the offer's global key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfferId(u64);

impl OfferId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Draw a random 64-bit id.
    ///
    /// Collisions between two open offers of the same maker are possible in
    /// principle; the registry rejects them with `DuplicateOffer`.
    pub fn random() -> Self {
        Self(rand::random())
    }

    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Little-endian encoding used as a derivation seed
    pub const fn to_le_bytes(&self) -> [u8; 8] {
        self.0.to_le_bytes()
    }
}

impl From<u64> for OfferId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a committed ledger transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(Uuid);

impl TxId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TxId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

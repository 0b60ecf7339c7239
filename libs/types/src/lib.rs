//! Types library for the Themis escrow protocol
//!
//! Plain data shared by the protocol core and its clients: ledger addresses,
//! identifiers, the persisted offer record, and the account variants the
//! ledger stores.
//!
//! # Modules
//! - `address`: 32-byte ledger addresses
//! - `ids`: Offer and transaction identifiers
//! - `amount`: Base-unit / UI-scaled amount conversion
//! - `offer`: The escrow offer record and its lifecycle states
//! - `account`: Ledger account variants (wallet, mint, holding, offer)
//! - `errors`: Parsing and validation errors

pub mod account;
pub mod address;
pub mod amount;
pub mod errors;
pub mod ids;
pub mod offer;

// Library version constant
pub const LIB_VERSION: &str = "0.1.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::account::*;
    pub use crate::address::*;
    pub use crate::amount::*;
    pub use crate::errors::*;
    pub use crate::ids::*;
    pub use crate::offer::*;
}

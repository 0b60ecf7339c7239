//! Escrow protocol core: trustless two-party asset swaps
//!
//! A maker locks an exact quantity of one asset in a vault that no key can
//! control, asking for an exact quantity of another asset in return. A taker
//! settles by paying the maker and receiving the vault contents in one atomic
//! instruction; alternatively the maker refunds and gets the deposit back.
//!
//! # Modules
//! - `config`: Program id and reservation schedule
//! - `derivation`: Key-less address derivation and vault authority proofs
//! - `errors`: Component error taxonomies and the top-level `EscrowError`
//! - `events`: Events emitted by successful transitions
//! - `instruction`: Instruction set and signed transactions
//! - `security`: Credential providers and signature verification
//! - `store`: Account storage seam and staged working sets
//! - `registry`: Offer records keyed by `(maker, offer_id)`
//! - `vault`: Vault custody (open, release-and-close)
//! - `transfer`: Atomic multi-leg asset movement
//! - `processor`: The Make / Take / Refund state machine
//! - `ledger`: In-memory reference ledger with receipts and provisioning

pub mod config;
pub mod derivation;
pub mod errors;
pub mod events;
pub mod instruction;
pub mod ledger;
pub mod processor;
pub mod registry;
pub mod security;
pub mod store;
pub mod transfer;
pub mod vault;

pub use config::EscrowConfig;
pub use errors::{ErrorKind, EscrowError};
pub use events::EscrowEvent;
pub use instruction::{EscrowInstruction, Transaction};
pub use ledger::{InMemoryLedger, Receipt};
pub use processor::OfferStateMachine;
pub use security::{CredentialProvider, Keypair};

/// Instruction ABI version; bump when `EscrowInstruction::message_bytes` changes
pub const ESCROW_ABI_VERSION: &str = "1.0.0";

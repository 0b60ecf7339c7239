//! Escrow error types
//!
//! Each component has its own taxonomy; `EscrowError` is what an instruction
//! returns. Wrapped reserve, derivation and transfer failures are flattened
//! into their top-level variants so callers match on one level.

use themis_types::address::Address;
use themis_types::ids::OfferId;
use themis_types::offer::OfferState;
use thiserror::Error;

/// Native-unit reservation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReserveError {
    #[error("Insufficient reserve in {account}: required {required}, available {available}")]
    InsufficientReserve {
        account: Address,
        required: u64,
        available: u64,
    },

    #[error("Arithmetic overflow crediting reserve of {account}")]
    Overflow { account: Address },
}

/// Address derivation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DerivationError {
    #[error("No off-curve address exists for namespace {namespace}")]
    Exhausted { namespace: String },

    #[error("Derivation proof does not reproduce address {address}")]
    ProofMismatch { address: Address },
}

/// Offer registry errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Duplicate offer: maker {maker} already has open offer {offer_id}")]
    DuplicateOffer { maker: Address, offer_id: OfferId },

    #[error("Offer not found: maker {maker}, offer {offer_id}")]
    NotFound { maker: Address, offer_id: OfferId },

    #[error("Offer record address {address} is occupied by a {kind} account")]
    AddressOccupied { address: Address, kind: &'static str },

    #[error("Derivation error: {0}")]
    Derivation(#[from] DerivationError),

    #[error("Reserve error: {0}")]
    Reserve(#[from] ReserveError),
}

/// Vault custody errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CustodyError {
    #[error("Vault address already occupied: {address}")]
    AlreadyExists { address: Address },

    #[error("Vault not found: {address}")]
    VaultNotFound { address: Address },

    #[error("Authority mismatch for vault {address}")]
    AuthorityMismatch { address: Address },

    #[error("Insufficient vault funds: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("Vault {address} would retain {remaining} after release")]
    VaultNotEmpty { address: Address, remaining: u64 },

    #[error("Mint not found: {mint}")]
    MintNotFound { mint: Address },

    #[error("Reserve error: {0}")]
    Reserve(#[from] ReserveError),

    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),
}

/// Asset movement errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransferError {
    #[error("Insufficient balance in {account}: required {required}, available {available}")]
    InsufficientBalance {
        account: Address,
        required: u64,
        available: u64,
    },

    #[error("Destination holding account missing: {account} for mint {mint}")]
    DestinationMissing { account: Address, mint: Address },

    #[error("Mint mismatch on {account}: expected {expected}, found {actual}")]
    MintMismatch {
        account: Address,
        expected: Address,
        actual: Address,
    },

    #[error("Decimals mismatch for mint {mint}: expected {expected}, found {actual}")]
    DecimalsMismatch { mint: Address, expected: u8, actual: u8 },

    #[error("Mint not found: {mint}")]
    MintNotFound { mint: Address },

    #[error("Authority mismatch: {authority} cannot debit {account}")]
    AuthorityMismatch { account: Address, authority: Address },

    #[error("Transfer amount must be positive")]
    InvalidAmount,

    #[error("Arithmetic overflow crediting {account}")]
    Overflow { account: Address },
}

/// Provisioning errors raised by the in-memory ledger
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Account already exists: {address}")]
    AccountExists { address: Address },

    #[error("Account not found: {address}")]
    AccountNotFound { address: Address },

    #[error("Account {address} is a {actual} account, expected {expected}")]
    WrongAccountKind {
        address: Address,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Invalid mint decimals: {decimals}")]
    InvalidDecimals { decimals: u8 },

    #[error("Arithmetic overflow on {address}")]
    Overflow { address: Address },
}

/// Coarse classification that tells a client what to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or conflicting input: fix the request
    BadInput,
    /// The offer is gone or no longer open: re-fetch state
    StaleOffer,
    /// Wrong or missing signer: abort
    NotAuthorized,
    /// A participant lacks funds or a holding account: fund and retry
    Funding,
    /// Internal consistency fault: should be unreachable
    Internal,
}

/// Top-level instruction error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EscrowError {
    #[error("Invalid parameters: {reason}")]
    InvalidParameters { reason: String },

    #[error("Offer {offer_id} of maker {maker} is not open (state {state})")]
    OfferNotOpen {
        maker: Address,
        offer_id: OfferId,
        state: OfferState,
    },

    #[error("Unauthorized: {signer} is not the maker of offer {offer_id}")]
    Unauthorized { signer: Address, offer_id: OfferId },

    #[error("Missing signature from {signer}")]
    MissingSignature { signer: Address },

    #[error("Invalid signature from {signer}")]
    InvalidSignature { signer: Address },

    #[error("Mint not found: {mint}")]
    MintNotFound { mint: Address },

    #[error("Derivation error: {0}")]
    Derivation(#[from] DerivationError),

    #[error("Registry error: {0}")]
    Registry(RegistryError),

    #[error("Custody error: {0}")]
    Custody(CustodyError),

    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("Reserve error: {0}")]
    Reserve(#[from] ReserveError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl From<RegistryError> for EscrowError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Derivation(inner) => EscrowError::Derivation(inner),
            RegistryError::Reserve(inner) => EscrowError::Reserve(inner),
            other => EscrowError::Registry(other),
        }
    }
}

impl From<CustodyError> for EscrowError {
    fn from(err: CustodyError) -> Self {
        match err {
            CustodyError::Reserve(inner) => EscrowError::Reserve(inner),
            CustodyError::Transfer(inner) => EscrowError::Transfer(inner),
            CustodyError::MintNotFound { mint } => EscrowError::MintNotFound { mint },
            other => EscrowError::Custody(other),
        }
    }
}

impl EscrowError {
    /// Classify the failure for retry decisions.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EscrowError::InvalidParameters { .. } | EscrowError::MintNotFound { .. } => {
                ErrorKind::BadInput
            }
            EscrowError::OfferNotOpen { .. } => ErrorKind::StaleOffer,
            EscrowError::Unauthorized { .. }
            | EscrowError::MissingSignature { .. }
            | EscrowError::InvalidSignature { .. } => ErrorKind::NotAuthorized,
            EscrowError::Derivation(DerivationError::Exhausted { .. }) => ErrorKind::BadInput,
            EscrowError::Derivation(DerivationError::ProofMismatch { .. }) => ErrorKind::Internal,
            EscrowError::Registry(err) => match err {
                RegistryError::DuplicateOffer { .. } | RegistryError::AddressOccupied { .. } => {
                    ErrorKind::BadInput
                }
                RegistryError::NotFound { .. } => ErrorKind::StaleOffer,
                RegistryError::Derivation(_) | RegistryError::Reserve(_) => ErrorKind::Internal,
            },
            EscrowError::Custody(err) => match err {
                CustodyError::AlreadyExists { .. } | CustodyError::MintNotFound { .. } => {
                    ErrorKind::BadInput
                }
                CustodyError::VaultNotFound { .. } => ErrorKind::StaleOffer,
                _ => ErrorKind::Internal,
            },
            EscrowError::Transfer(err) => match err {
                TransferError::InsufficientBalance { .. }
                | TransferError::DestinationMissing { .. } => ErrorKind::Funding,
                TransferError::AuthorityMismatch { .. } => ErrorKind::NotAuthorized,
                TransferError::MintMismatch { .. }
                | TransferError::DecimalsMismatch { .. }
                | TransferError::MintNotFound { .. }
                | TransferError::InvalidAmount => ErrorKind::BadInput,
                TransferError::Overflow { .. } => ErrorKind::Internal,
            },
            EscrowError::Reserve(ReserveError::InsufficientReserve { .. }) => ErrorKind::Funding,
            EscrowError::Reserve(ReserveError::Overflow { .. }) => ErrorKind::Internal,
            EscrowError::Ledger(_) => ErrorKind::BadInput,
        }
    }

    /// True when the referenced offer no longer exists or is no longer open.
    pub fn is_stale_offer(&self) -> bool {
        self.kind() == ErrorKind::StaleOffer
    }
}

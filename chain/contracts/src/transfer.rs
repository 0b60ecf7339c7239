//! Asset transfer engine
//!
//! Executes one or more legs as a single unit on a nested working set: either
//! every leg applies or none does. A leg moves base units of one mint between
//! two holding accounts and names the authority entitled to debit the source:
//! - a verified signer who owns the source, or
//! - the `VaultAuthority` of a derived vault.
//!
//! Legs use checked-transfer semantics: the caller states the mint decimals
//! it expects, and a mismatch rejects the leg.

use themis_types::address::Address;
use tracing::debug;

use crate::derivation::VaultAuthority;
use crate::errors::TransferError;
use crate::security::SignerSet;
use crate::store::{AccountStore, WorkingSet};

/// Who authorizes debiting a leg's source
#[derive(Debug)]
pub enum LegAuthority<'a> {
    /// A participant who signed the transaction
    Signer(Address),
    /// A derived vault, authorized by its derivation proof
    Vault(&'a VaultAuthority),
}

impl LegAuthority<'_> {
    fn address(&self) -> Address {
        match self {
            LegAuthority::Signer(address) => *address,
            LegAuthority::Vault(authority) => authority.address(),
        }
    }
}

/// One asset movement
#[derive(Debug)]
pub struct Leg<'a> {
    pub source: Address,
    pub destination: Address,
    pub mint: Address,
    pub amount: u64,
    pub decimals: u8,
    pub authority: LegAuthority<'a>,
}

impl<'a> Leg<'a> {
    /// Leg debited from a signer-owned holding account.
    pub fn signed(
        owner: Address,
        source: Address,
        destination: Address,
        mint: Address,
        amount: u64,
        decimals: u8,
    ) -> Self {
        Self {
            source,
            destination,
            mint,
            amount,
            decimals,
            authority: LegAuthority::Signer(owner),
        }
    }

    /// Leg debited from a vault under its derivation proof.
    pub fn from_vault(
        authority: &'a VaultAuthority,
        destination: Address,
        mint: Address,
        amount: u64,
        decimals: u8,
    ) -> Self {
        Self {
            source: authority.address(),
            destination,
            mint,
            amount,
            decimals,
            authority: LegAuthority::Vault(authority),
        }
    }
}

/// Atomic multi-leg transfer executor
#[derive(Debug, Clone, Copy, Default)]
pub struct AssetTransferEngine;

impl AssetTransferEngine {
    pub fn new() -> Self {
        Self
    }

    /// Execute `legs` in order, all or nothing.
    pub fn execute<S: AccountStore>(
        &self,
        store: &mut S,
        signers: &SignerSet,
        legs: &[Leg<'_>],
    ) -> Result<(), TransferError> {
        let mut scope = WorkingSet::new(store);
        for leg in legs {
            Self::apply_leg(&mut scope, signers, leg)?;
        }
        scope.commit();
        Ok(())
    }

    fn apply_leg<S: AccountStore>(
        store: &mut S,
        signers: &SignerSet,
        leg: &Leg<'_>,
    ) -> Result<(), TransferError> {
        if leg.amount == 0 {
            return Err(TransferError::InvalidAmount);
        }

        // Mint and decimals
        let mint = store
            .get(&leg.mint)
            .and_then(|account| account.as_mint())
            .ok_or(TransferError::MintNotFound { mint: leg.mint })?;
        if mint.decimals != leg.decimals {
            return Err(TransferError::DecimalsMismatch {
                mint: leg.mint,
                expected: leg.decimals,
                actual: mint.decimals,
            });
        }

        // Source: existence, mint, authority, funds
        let authority = leg.authority.address();
        let source = store
            .get(&leg.source)
            .and_then(|account| account.as_holding())
            .ok_or(TransferError::InsufficientBalance {
                account: leg.source,
                required: leg.amount,
                available: 0,
            })?;
        if source.mint != leg.mint {
            return Err(TransferError::MintMismatch {
                account: leg.source,
                expected: leg.mint,
                actual: source.mint,
            });
        }
        let authorized = source.owner == authority
            && match &leg.authority {
                LegAuthority::Signer(signer) => signers.contains(signer),
                LegAuthority::Vault(vault) => vault.address() == leg.source,
            };
        if !authorized {
            return Err(TransferError::AuthorityMismatch {
                account: leg.source,
                authority,
            });
        }
        if source.amount < leg.amount {
            return Err(TransferError::InsufficientBalance {
                account: leg.source,
                required: leg.amount,
                available: source.amount,
            });
        }

        // Destination: existence, mint
        let destination = store
            .get(&leg.destination)
            .and_then(|account| account.as_holding())
            .ok_or(TransferError::DestinationMissing {
                account: leg.destination,
                mint: leg.mint,
            })?;
        if destination.mint != leg.mint {
            return Err(TransferError::MintMismatch {
                account: leg.destination,
                expected: leg.mint,
                actual: destination.mint,
            });
        }

        // Move
        if let Some(source) = store
            .get_mut(&leg.source)
            .and_then(|account| account.as_holding_mut())
        {
            source.amount -= leg.amount;
        }
        let destination = store
            .get_mut(&leg.destination)
            .and_then(|account| account.as_holding_mut())
            .ok_or(TransferError::DestinationMissing {
                account: leg.destination,
                mint: leg.mint,
            })?;
        destination.amount = destination
            .amount
            .checked_add(leg.amount)
            .ok_or(TransferError::Overflow {
                account: leg.destination,
            })?;

        debug!(
            source = %leg.source.short(),
            destination = %leg.destination.short(),
            mint = %leg.mint.short(),
            amount = leg.amount,
            "Transfer leg applied"
        );
        Ok(())
    }
}

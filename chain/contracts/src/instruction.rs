//! Instruction set and signed transactions
//!
//! Three mutating instructions exist. Each names its signer and the offer key
//! explicitly; take and refund never restate amounts or mints, which are
//! always read back from the stored record.

use serde::{Deserialize, Serialize};
use themis_types::address::Address;
use themis_types::ids::OfferId;

use crate::errors::EscrowError;
use crate::security::{CredentialProvider, SignerSet};

/// Domain separator prefixed to every signed message
pub const MESSAGE_DOMAIN: &[u8] = b"themis-escrow/v1";

/// Escrow instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "instruction", rename_all = "snake_case")]
pub enum EscrowInstruction {
    /// Lock `deposit_amount` of `deposit_mint` against `receive_amount` of
    /// `receive_mint`.
    MakeOffer {
        maker: Address,
        offer_id: OfferId,
        deposit_mint: Address,
        receive_mint: Address,
        deposit_amount: u64,
        receive_amount: u64,
    },
    /// Settle the offer `(maker, offer_id)`; any funded signer may take.
    TakeOffer {
        taker: Address,
        maker: Address,
        offer_id: OfferId,
    },
    /// Return the deposit of `(maker, offer_id)`; `signer` must be the maker.
    RefundOffer {
        signer: Address,
        maker: Address,
        offer_id: OfferId,
    },
}

impl EscrowInstruction {
    /// The party whose signature the instruction requires
    pub fn signer(&self) -> Address {
        match self {
            EscrowInstruction::MakeOffer { maker, .. } => *maker,
            EscrowInstruction::TakeOffer { taker, .. } => *taker,
            EscrowInstruction::RefundOffer { signer, .. } => *signer,
        }
    }

    /// Key of the offer the instruction targets
    pub fn offer_key(&self) -> (Address, OfferId) {
        match self {
            EscrowInstruction::MakeOffer {
                maker, offer_id, ..
            }
            | EscrowInstruction::TakeOffer {
                maker, offer_id, ..
            }
            | EscrowInstruction::RefundOffer {
                maker, offer_id, ..
            } => (*maker, *offer_id),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EscrowInstruction::MakeOffer { .. } => "make_offer",
            EscrowInstruction::TakeOffer { .. } => "take_offer",
            EscrowInstruction::RefundOffer { .. } => "refund_offer",
        }
    }

    /// Deterministic byte encoding that signers sign.
    ///
    /// Layout: domain, one tag byte, then fixed-width fields in declaration
    /// order (addresses raw, integers little-endian).
    pub fn message_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(MESSAGE_DOMAIN.len() + 1 + 3 * 32 + 3 * 8);
        out.extend_from_slice(MESSAGE_DOMAIN);
        match self {
            EscrowInstruction::MakeOffer {
                maker,
                offer_id,
                deposit_mint,
                receive_mint,
                deposit_amount,
                receive_amount,
            } => {
                out.push(0);
                out.extend_from_slice(maker.as_bytes());
                out.extend_from_slice(&offer_id.to_le_bytes());
                out.extend_from_slice(deposit_mint.as_bytes());
                out.extend_from_slice(receive_mint.as_bytes());
                out.extend_from_slice(&deposit_amount.to_le_bytes());
                out.extend_from_slice(&receive_amount.to_le_bytes());
            }
            EscrowInstruction::TakeOffer {
                taker,
                maker,
                offer_id,
            } => {
                out.push(1);
                out.extend_from_slice(taker.as_bytes());
                out.extend_from_slice(maker.as_bytes());
                out.extend_from_slice(&offer_id.to_le_bytes());
            }
            EscrowInstruction::RefundOffer {
                signer,
                maker,
                offer_id,
            } => {
                out.push(2);
                out.extend_from_slice(signer.as_bytes());
                out.extend_from_slice(maker.as_bytes());
                out.extend_from_slice(&offer_id.to_le_bytes());
            }
        }
        out
    }
}

/// One signature attached to a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEntry {
    pub signer: Address,
    /// 64-byte Ed25519 signature
    pub signature: Vec<u8>,
}

/// An instruction plus the signatures authorizing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub instruction: EscrowInstruction,
    pub signatures: Vec<SignatureEntry>,
}

impl Transaction {
    /// Sign `instruction` with every provider in `signers`.
    pub fn sign(instruction: EscrowInstruction, signers: &[&dyn CredentialProvider]) -> Self {
        let message = instruction.message_bytes();
        let signatures = signers
            .iter()
            .map(|provider| SignatureEntry {
                signer: provider.address(),
                signature: provider.sign(&message).to_bytes().to_vec(),
            })
            .collect();
        Self {
            instruction,
            signatures,
        }
    }

    /// Verify every attached signature and return the verified signer set.
    pub fn verify_signers(&self) -> Result<SignerSet, EscrowError> {
        let message = self.instruction.message_bytes();
        SignerSet::verify(
            &message,
            self.signatures
                .iter()
                .map(|entry| (&entry.signer, entry.signature.as_slice())),
        )
    }
}

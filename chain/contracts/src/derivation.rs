//! Key-less address derivation
//!
//! A derived address is the SHA-256 digest of a namespace tag, the seeds, a
//! one-byte bump and the program id. The bump counts down from 255 until the
//! digest is not a valid Ed25519 point, so nobody can hold a private key for
//! the result. The same inputs always give the same address.
//!
//! Deriving a vault address also yields a `VaultAuthority`: the capability
//! that custody requires before it will release vault funds. It can only be
//! obtained here.

use ed25519_dalek::VerifyingKey;
use sha2::{Digest, Sha256};
use themis_types::address::Address;
use themis_types::ids::OfferId;

use crate::errors::DerivationError;

/// Namespace of offer record addresses
pub const ESCROW_NAMESPACE: &[u8] = b"escrow";

/// Namespace of vault holding-account addresses
pub const VAULT_NAMESPACE: &[u8] = b"vault";

/// Namespace of participants' associated holding accounts
pub const HOLDING_NAMESPACE: &[u8] = b"holding";

const DERIVATION_MARKER: &[u8] = b"ThemisDerivedAddress";

/// Check whether `address` decodes to an Ed25519 curve point.
pub fn is_on_curve(address: &Address) -> bool {
    VerifyingKey::from_bytes(address.as_bytes()).is_ok()
}

/// Proof of authority over a derived vault address
///
/// Not `Clone`, not constructible outside this module. Whoever holds one
/// obtained it from `AddressDeriver::derive`.
#[derive(Debug, PartialEq, Eq)]
pub struct VaultAuthority {
    address: Address,
    program_id: Address,
    namespace: &'static [u8],
    maker: Address,
    offer_id: OfferId,
    bump: u8,
}

impl VaultAuthority {
    /// The derived address this authority controls
    pub fn address(&self) -> Address {
        self.address
    }

    /// Collision-avoidance counter used in the derivation
    pub fn bump(&self) -> u8 {
        self.bump
    }

    pub fn maker(&self) -> Address {
        self.maker
    }

    pub fn offer_id(&self) -> OfferId {
        self.offer_id
    }

    /// Re-hash the stored seeds and confirm they still produce `address`.
    pub fn verify(&self) -> Result<(), DerivationError> {
        let offer_id = self.offer_id.to_le_bytes();
        let seeds: [&[u8]; 2] = [self.maker.as_bytes(), &offer_id];
        let candidate = hash_seeds(&self.program_id, self.namespace, &seeds, self.bump);
        if candidate != self.address || is_on_curve(&candidate) {
            return Err(DerivationError::ProofMismatch {
                address: self.address,
            });
        }
        Ok(())
    }
}

/// Derives addresses for one program id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressDeriver {
    program_id: Address,
}

impl AddressDeriver {
    pub fn new(program_id: Address) -> Self {
        Self { program_id }
    }

    pub fn program_id(&self) -> Address {
        self.program_id
    }

    /// Derive the address of `(maker, offer_id)` under `namespace` together
    /// with the authority proof for it.
    pub fn derive(
        &self,
        namespace: &'static [u8],
        maker: &Address,
        offer_id: OfferId,
    ) -> Result<(Address, VaultAuthority), DerivationError> {
        let id_bytes = offer_id.to_le_bytes();
        let seeds: [&[u8]; 2] = [maker.as_bytes(), &id_bytes];
        let (address, bump) = self.find_address(namespace, &seeds)?;
        let authority = VaultAuthority {
            address,
            program_id: self.program_id,
            namespace,
            maker: *maker,
            offer_id,
            bump,
        };
        Ok((address, authority))
    }

    /// Associated holding address for `(owner, mint)`.
    pub fn associated_holding(
        &self,
        owner: &Address,
        mint: &Address,
    ) -> Result<Address, DerivationError> {
        let seeds: [&[u8]; 2] = [owner.as_bytes(), mint.as_bytes()];
        self.find_address(HOLDING_NAMESPACE, &seeds)
            .map(|(address, _)| address)
    }

    fn find_address(
        &self,
        namespace: &[u8],
        seeds: &[&[u8]],
    ) -> Result<(Address, u8), DerivationError> {
        for bump in (0..=u8::MAX).rev() {
            let candidate = hash_seeds(&self.program_id, namespace, seeds, bump);
            if !is_on_curve(&candidate) {
                return Ok((candidate, bump));
            }
        }
        Err(DerivationError::Exhausted {
            namespace: String::from_utf8_lossy(namespace).into_owned(),
        })
    }
}

fn hash_seeds(program_id: &Address, namespace: &[u8], seeds: &[&[u8]], bump: u8) -> Address {
    let mut hasher = Sha256::new();
    hasher.update([namespace.len() as u8]);
    hasher.update(namespace);
    for seed in seeds {
        hasher.update([seed.len() as u8]);
        hasher.update(seed);
    }
    hasher.update([bump]);
    hasher.update(program_id.as_bytes());
    hasher.update(DERIVATION_MARKER);
    Address::new(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;

    fn deriver() -> AddressDeriver {
        AddressDeriver::new(Address::new([7; 32]))
    }

    #[test]
    fn test_derive_is_deterministic() {
        let maker = Address::new_unique();
        let (a1, auth1) = deriver().derive(VAULT_NAMESPACE, &maker, OfferId::new(1111)).unwrap();
        let (a2, auth2) = deriver().derive(VAULT_NAMESPACE, &maker, OfferId::new(1111)).unwrap();
        assert_eq!(a1, a2);
        assert_eq!(auth1, auth2);
        assert_eq!(auth1.address(), a1);
    }

    #[test]
    fn test_different_offer_ids_differ() {
        let maker = Address::new_unique();
        let (a1, _) = deriver().derive(VAULT_NAMESPACE, &maker, OfferId::new(1)).unwrap();
        let (a2, _) = deriver().derive(VAULT_NAMESPACE, &maker, OfferId::new(2)).unwrap();
        assert_ne!(a1, a2);
    }

    #[test]
    fn test_namespaces_and_programs_separate() {
        let maker = Address::new_unique();
        let id = OfferId::new(9);
        let (vault, _) = deriver().derive(VAULT_NAMESPACE, &maker, id).unwrap();
        let (record, _) = deriver().derive(ESCROW_NAMESPACE, &maker, id).unwrap();
        let (other, _) = AddressDeriver::new(Address::new([8; 32]))
            .derive(VAULT_NAMESPACE, &maker, id)
            .unwrap();
        assert_ne!(vault, record);
        assert_ne!(vault, other);
    }

    #[test]
    fn test_derived_addresses_are_off_curve() {
        let maker = Address::new_unique();
        for id in 0..32u64 {
            let (address, authority) = deriver().derive(VAULT_NAMESPACE, &maker, OfferId::new(id)).unwrap();
            assert!(!is_on_curve(&address));
            authority.verify().unwrap();
        }
    }

    #[test]
    fn test_public_keys_are_on_curve() {
        let key = SigningKey::from_bytes(&[42; 32]);
        let address = Address::new(key.verifying_key().to_bytes());
        assert!(is_on_curve(&address));
    }

    #[test]
    fn test_tampered_authority_fails_verification() {
        let maker = Address::new_unique();
        let (_, mut authority) = deriver().derive(VAULT_NAMESPACE, &maker, OfferId::new(5)).unwrap();
        authority.offer_id = OfferId::new(6);
        assert!(matches!(
            authority.verify(),
            Err(DerivationError::ProofMismatch { .. })
        ));
    }

    #[test]
    fn test_associated_holding_depends_on_owner_and_mint() {
        let owner = Address::new_unique();
        let mint_a = Address::new_unique();
        let mint_b = Address::new_unique();
        let a = deriver().associated_holding(&owner, &mint_a).unwrap();
        let b = deriver().associated_holding(&owner, &mint_b).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, deriver().associated_holding(&owner, &mint_a).unwrap());
    }
}

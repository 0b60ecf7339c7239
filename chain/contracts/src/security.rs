//! Signer identity and signature verification
//!
//! Credentials are passed in at call time through `CredentialProvider`; the
//! core keeps no process-wide key material. A `SignerSet` is the set of
//! addresses whose Ed25519 signatures over a transaction verified. It can
//! only be produced by verification, so holding one is evidence that those
//! parties authorized the instruction.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use std::collections::BTreeSet;
use themis_types::address::Address;

use crate::errors::EscrowError;

/// Source of a participant's signatures
pub trait CredentialProvider {
    /// Address (public key) of the participant
    fn address(&self) -> Address;

    /// Sign `message` with the participant's key.
    fn sign(&self, message: &[u8]) -> Signature;
}

/// In-process Ed25519 keypair
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Rebuild a keypair from its 32-byte secret.
    pub fn from_secret_bytes(secret: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(secret),
        }
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }
}

impl CredentialProvider for Keypair {
    fn address(&self) -> Address {
        Address::new(self.signing_key.verifying_key().to_bytes())
    }

    fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Verify an Ed25519 signature by `signer` over `message`.
pub fn verify_signature(
    signer: &Address,
    message: &[u8],
    signature: &[u8],
) -> Result<(), EscrowError> {
    let invalid = || EscrowError::InvalidSignature { signer: *signer };

    let verifying_key = VerifyingKey::from_bytes(signer.as_bytes()).map_err(|_| invalid())?;
    let sig_bytes: [u8; 64] = signature.try_into().map_err(|_| invalid())?;
    let signature = Signature::from_bytes(&sig_bytes);

    verifying_key
        .verify(message, &signature)
        .map_err(|_| invalid())
}

/// Addresses whose signatures verified for one transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignerSet {
    signers: BTreeSet<Address>,
}

impl SignerSet {
    /// Verify each `(signer, signature)` over `message` and collect the signers.
    ///
    /// Any invalid signature rejects the whole set.
    pub fn verify<'a>(
        message: &[u8],
        entries: impl IntoIterator<Item = (&'a Address, &'a [u8])>,
    ) -> Result<Self, EscrowError> {
        let mut signers = BTreeSet::new();
        for (signer, signature) in entries {
            verify_signature(signer, message, signature)?;
            signers.insert(*signer);
        }
        Ok(Self { signers })
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.signers.contains(address)
    }

    /// Require `address` to have signed.
    pub fn require(&self, address: &Address) -> Result<(), EscrowError> {
        if !self.contains(address) {
            return Err(EscrowError::MissingSignature { signer: *address });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.signers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_address_is_public_key() {
        let keypair = Keypair::from_secret_bytes(&[1; 32]);
        assert_eq!(
            keypair.address().to_bytes(),
            keypair.verifying_key().to_bytes()
        );
    }

    #[test]
    fn test_verify_signature_roundtrip() {
        let keypair = Keypair::generate();
        let signature = keypair.sign(b"make offer");
        verify_signature(&keypair.address(), b"make offer", &signature.to_bytes()).unwrap();
    }

    #[test]
    fn test_verify_signature_wrong_message() {
        let keypair = Keypair::generate();
        let signature = keypair.sign(b"make offer");
        let result = verify_signature(&keypair.address(), b"take offer", &signature.to_bytes());
        assert_eq!(
            result,
            Err(EscrowError::InvalidSignature {
                signer: keypair.address()
            })
        );
    }

    #[test]
    fn test_verify_signature_truncated() {
        let keypair = Keypair::generate();
        let result = verify_signature(&keypair.address(), b"msg", &[0u8; 10]);
        assert!(matches!(result, Err(EscrowError::InvalidSignature { .. })));
    }

    #[test]
    fn test_signer_set_require() {
        let alice = Keypair::generate();
        let bob = Keypair::generate();
        let sig = alice.sign(b"msg").to_bytes();
        let alice_address = alice.address();

        let set = SignerSet::verify(b"msg", [(&alice_address, &sig[..])]).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.require(&alice_address).is_ok());
        assert_eq!(
            set.require(&bob.address()),
            Err(EscrowError::MissingSignature {
                signer: bob.address()
            })
        );
    }

    #[test]
    fn test_signer_set_rejects_forged_entry() {
        let alice = Keypair::generate();
        let mallory = Keypair::generate();
        let forged = mallory.sign(b"msg").to_bytes();
        let alice_address = alice.address();

        let result = SignerSet::verify(b"msg", [(&alice_address, &forged[..])]);
        assert!(matches!(result, Err(EscrowError::InvalidSignature { .. })));
    }
}

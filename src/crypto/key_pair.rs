//! Schnorr signature key pairs on secp256k1.

use crate::types::address::{Address, ADDRESS_SIZE};
use crate::types::encoding::{Decode, DecodeError, Encode, EncodeSink};
use crate::types::hash::Hash;
use k256::schnorr::signature::{Signer, Verifier};
use k256::schnorr::{Signature, SigningKey, VerifyingKey};
use rand_core::OsRng;

/// Private key for signing transactions.
///
/// Never serialized; the debug harness derives throwaway keys
/// deterministically from a seed instead of persisting them.
#[derive(Clone)]
pub struct PrivateKey {
    key: SigningKey,
}

/// Public key for signature verification and address derivation.
///
/// The address is derived by hashing the verifying key with SHA3-256 and
/// taking the last 20 bytes. `Copy` because public keys ride along with
/// every transaction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    pub key: VerifyingKey,
    pub address: Address,
}

/// Wrapper around a Schnorr signature adding the binary codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchnorrSignature(pub Signature);

impl PrivateKey {
    /// Generates a new random private key using OS-provided entropy.
    pub fn generate() -> Self {
        let mut rng = OsRng;
        Self {
            key: SigningKey::random(&mut rng),
        }
    }

    /// Creates a private key from raw bytes.
    ///
    /// Returns `None` if the bytes do not represent a valid secp256k1 scalar.
    pub fn from_bytes(bytes: &[u8; 32]) -> Option<Self> {
        SigningKey::from_bytes(bytes).ok().map(|key| Self { key })
    }

    /// Derives a private key deterministically from a seed.
    ///
    /// Hashes the seed with an incrementing counter until the digest is a
    /// valid scalar. The debug harness uses this to mint reproducible
    /// synthetic accounts.
    pub fn from_seed(seed: &[u8]) -> Self {
        let mut counter: u64 = 0;
        loop {
            let digest = Hash::sha3()
                .chain(b"KEYGEN")
                .chain(seed)
                .chain(&counter.to_le_bytes())
                .finalize();
            if let Some(key) = Self::from_bytes(&digest.0) {
                return key;
            }
            counter += 1;
        }
    }

    /// Derives the corresponding public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::new(self)
    }

    /// Returns the account address for this key.
    pub fn address(&self) -> Address {
        self.public_key().address
    }

    /// Signs arbitrary data, producing a Schnorr signature.
    pub fn sign(&self, data: &[u8]) -> SchnorrSignature {
        SchnorrSignature(self.key.sign(data))
    }
}

impl PublicKey {
    /// Derives a public key from a private key and computes its address.
    ///
    /// Address derivation: SHA3-256(verifying_key_bytes)[12..32]
    pub(crate) fn new(private: &PrivateKey) -> Self {
        let vk = private.key.verifying_key();
        PublicKey {
            key: *vk,
            address: derive_address(vk),
        }
    }

    /// Verifies a Schnorr signature against the given data.
    pub fn verify(&self, data: &[u8], signature: SchnorrSignature) -> bool {
        self.key.verify(data, &signature.0).is_ok()
    }
}

fn derive_address(key: &VerifyingKey) -> Address {
    let digest = Hash::digest(key.to_bytes().as_slice());
    let mut bytes = [0u8; ADDRESS_SIZE];
    bytes.copy_from_slice(&digest.0[12..]);
    Address(bytes)
}

impl Encode for PublicKey {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        out.write(self.key.to_bytes().as_slice());
    }
}

impl Decode for PublicKey {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        let key_bytes = <[u8; 32]>::decode(input)?;
        let key = VerifyingKey::from_bytes(&key_bytes).map_err(|_| DecodeError::InvalidValue)?;

        // Re-derive the address so the invariant between key and address
        // cannot be broken by crafted input.
        Ok(PublicKey {
            key,
            address: derive_address(&key),
        })
    }
}

impl Encode for SchnorrSignature {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        let bytes: [u8; 64] = self.0.to_bytes();
        out.write(&bytes);
    }
}

impl Decode for SchnorrSignature {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        let bytes = <[u8; 64]>::decode(input)?;
        let signature =
            Signature::try_from(bytes.as_slice()).map_err(|_| DecodeError::InvalidValue)?;
        Ok(SchnorrSignature(signature))
    }
}

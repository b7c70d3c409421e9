//! Signed value-transfer transactions.

use crate::core::value::ParamValue;
use crate::crypto::key_pair::{PrivateKey, PublicKey, SchnorrSignature};
use crate::types::address::Address;
use crate::types::balance::Balance;
use crate::types::encoding::Encode;
use crate::types::hash::Hash;

/// A signed transaction invoking a named method.
///
/// `hash` is a pure function of every other field, signature included, so it
/// is fixed once at construction and the struct exposes no mutators. The
/// sender address is carried implicitly by `from`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// Name of the method handler to invoke.
    pub method: String,
    /// Method-specific structured input.
    pub input: ParamValue,
    /// Principal moved into escrow before the method body runs.
    pub value: Balance,
    /// Fee paid to the block's coinbase regardless of method outcome.
    pub fee: Balance,
    /// Must equal the sender's stored nonce + 1.
    pub nonce: u64,
    /// Sender's public key; the sender address derives from it.
    pub from: PublicKey,
    /// Schnorr signature over the signing hash.
    pub signature: SchnorrSignature,
    /// Content-derived identifier, covering all fields above.
    hash: Hash,
}

impl Transaction {
    /// Builds and signs a transaction.
    pub fn new(
        method: impl Into<String>,
        input: ParamValue,
        value: Balance,
        fee: Balance,
        nonce: u64,
        key: &PrivateKey,
    ) -> Self {
        let method = method.into();
        let from = key.public_key();
        let signing_hash = signing_hash(&method, &input, value, fee, nonce, &from);
        let signature = key.sign(signing_hash.as_slice());

        let hash = content_hash(&method, &input, value, fee, nonce, &from, &signature);

        Transaction {
            method,
            input,
            value,
            fee,
            nonce,
            from,
            signature,
            hash,
        }
    }

    /// Returns the content-derived transaction identifier.
    pub fn hash(&self) -> Hash {
        self.hash
    }

    /// Returns the sender's address.
    pub fn sender(&self) -> Address {
        self.from.address
    }

    /// Verifies the signature against the carried public key.
    pub fn verify(&self) -> bool {
        let signing = signing_hash(
            &self.method,
            &self.input,
            self.value,
            self.fee,
            self.nonce,
            &self.from,
        );
        self.from.verify(signing.as_slice(), self.signature)
    }
}

/// Hash signed by the sender: all fields except the signature.
fn signing_hash(
    method: &str,
    input: &ParamValue,
    value: Balance,
    fee: Balance,
    nonce: u64,
    from: &PublicKey,
) -> Hash {
    let mut h = Hash::sha3();
    h.update(b"TX");
    method.encode(&mut h);
    input.encode(&mut h);
    value.encode(&mut h);
    fee.encode(&mut h);
    nonce.encode(&mut h);
    from.encode(&mut h);
    h.finalize()
}

/// Transaction identifier: every field, signature included, so two
/// transactions with identical payloads but different signatures never share
/// an id.
fn content_hash(
    method: &str,
    input: &ParamValue,
    value: Balance,
    fee: Balance,
    nonce: u64,
    from: &PublicKey,
    signature: &SchnorrSignature,
) -> Hash {
    let mut h = Hash::sha3();
    h.update(b"TXID");
    method.encode(&mut h);
    input.encode(&mut h);
    value.encode(&mut h);
    fee.encode(&mut h);
    nonce.encode(&mut h);
    from.encode(&mut h);
    signature.encode(&mut h);
    h.finalize()
}

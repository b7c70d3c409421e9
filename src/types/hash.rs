//! 32-byte SHA3-256 hash type with incremental hashing support.

use crate::types::encoding::EncodeSink;
use sha3::{Digest, Sha3_256};
use std::fmt;
use valuechain_derive::BinaryCodec;

/// SHA3-256 hash length in bytes.
pub const HASH_LEN: usize = 32;

/// Fixed-size 32-byte hash used for transaction ids, header hashes, and
/// state-store keys.
///
/// This type is `Copy` - hashes are passed around constantly during execution
/// and stack allocation beats reference indirection at this size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BinaryCodec, Default, Hash, Ord, PartialOrd)]
pub struct Hash(pub [u8; HASH_LEN]);

impl Hash {
    /// Creates a zero-valued hash (all bytes 0x00).
    ///
    /// Serves as the genesis header's previous-hash sentinel.
    pub const fn zero() -> Hash {
        Hash([0u8; HASH_LEN])
    }

    /// Returns the hash as a byte slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Creates a new SHA3-256 hash builder for incremental hashing.
    pub fn sha3() -> HashBuilder {
        HashBuilder::new()
    }

    /// Hashes a single byte slice in one shot.
    pub fn digest(data: &[u8]) -> Hash {
        Hash::sha3().chain(data).finalize()
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Incremental SHA3-256 hash builder.
///
/// Implements [`EncodeSink`] so encodable values can be hashed directly
/// without an intermediate byte buffer.
pub struct HashBuilder {
    hasher: Sha3_256,
}

impl HashBuilder {
    /// Creates a new hash builder with empty state.
    pub fn new() -> Self {
        Self {
            hasher: Sha3_256::new(),
        }
    }

    /// Feeds data into the hash computation.
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Feeds data and returns the builder, for chained construction.
    pub fn chain(mut self, data: &[u8]) -> Self {
        self.update(data);
        self
    }

    /// Consumes the builder and returns the final hash.
    pub fn finalize(self) -> Hash {
        Hash(self.hasher.finalize().into())
    }
}

impl EncodeSink for HashBuilder {
    fn write(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::encoding::{Decode, Encode};

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(Hash::digest(b"abc"), Hash::digest(b"abc"));
        assert_ne!(Hash::digest(b"abc"), Hash::digest(b"abd"));
    }

    #[test]
    fn chain_equals_update() {
        let chained = Hash::sha3().chain(b"ab").chain(b"cd").finalize();

        let mut builder = Hash::sha3();
        builder.update(b"ab");
        builder.update(b"cd");
        assert_eq!(builder.finalize(), chained);
    }

    #[test]
    fn encode_sink_matches_digest() {
        let mut builder = Hash::sha3();
        42u64.encode(&mut builder);
        let via_sink = builder.finalize();

        assert_eq!(via_sink, Hash::digest(&42u64.to_le_bytes()));
    }

    #[test]
    fn display_is_lowercase_hex() {
        let rendered = Hash::zero().to_string();
        assert_eq!(rendered.len(), HASH_LEN * 2);
        assert!(rendered.chars().all(|c| c == '0'));
    }

    #[test]
    fn codec_roundtrip() {
        let hash = Hash::digest(b"roundtrip");
        let decoded = Hash::from_bytes(&hash.to_bytes()).unwrap();
        assert_eq!(decoded, hash);
    }
}

//! Block headers and header chaining.

use crate::types::address::Address;
use crate::types::encoding::Encode;
use crate::types::hash::Hash;
use valuechain_derive::BinaryCodec;

/// Block header: the execution engine's view of a block's position in the
/// chain and its reward recipient.
///
/// `hash` is derived from all other fields via [`BlockHeader::update_hash`]
/// and must be refreshed after any mutation. Construction helpers do this;
/// code assembling headers field-by-field is responsible for calling it.
#[derive(Clone, Debug, PartialEq, Eq, BinaryCodec)]
pub struct BlockHeader {
    /// Block height; genesis is 0.
    pub number: u64,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
    /// Address credited with the block's wage and fees.
    ///
    /// `None` for headers produced without a reward recipient; the executor
    /// then settles rewards on the chain's system address.
    pub coinbase: Option<Address>,
    /// Hash of the previous header, forming the chain.
    pub previous_hash: Hash,
    /// Content hash of this header.
    hash: Hash,
}

impl BlockHeader {
    /// Creates a genesis header (number 0, zero previous hash).
    pub fn genesis(timestamp: u64, coinbase: Option<Address>) -> Self {
        let mut header = BlockHeader {
            number: 0,
            timestamp,
            coinbase,
            previous_hash: Hash::zero(),
            hash: Hash::zero(),
        };
        header.update_hash();
        header
    }

    /// Creates an unlinked header; callers chain it with [`set_pre_block`].
    ///
    /// [`set_pre_block`]: BlockHeader::set_pre_block
    pub fn new(timestamp: u64, coinbase: Option<Address>) -> Self {
        let mut header = BlockHeader {
            number: 0,
            timestamp,
            coinbase,
            previous_hash: Hash::zero(),
            hash: Hash::zero(),
        };
        header.update_hash();
        header
    }

    /// Returns the current content hash.
    pub fn hash(&self) -> Hash {
        self.hash
    }

    /// Recomputes `hash` from the header contents.
    pub fn update_hash(&mut self) {
        let mut h = Hash::sha3();
        h.update(b"HEADER");
        self.number.encode(&mut h);
        self.timestamp.encode(&mut h);
        self.coinbase.encode(&mut h);
        self.previous_hash.encode(&mut h);
        self.hash = h.finalize();
    }

    /// Chains this header onto `previous`.
    ///
    /// Fixes `number = previous.number + 1`, links `previous_hash`, and
    /// refreshes the content hash.
    pub fn set_pre_block(&mut self, previous: &BlockHeader) {
        self.number = previous.number + 1;
        self.previous_hash = previous.hash();
        self.update_hash();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::utils::test_address;

    #[test]
    fn genesis_has_number_zero_and_zero_parent() {
        let header = BlockHeader::genesis(1_700_000_000, Some(test_address(1)));
        assert_eq!(header.number, 0);
        assert_eq!(header.previous_hash, Hash::zero());
        assert_ne!(header.hash(), Hash::zero());
    }

    #[test]
    fn update_hash_tracks_content() {
        let mut header = BlockHeader::genesis(1_700_000_000, None);
        let original = header.hash();

        header.timestamp += 10;
        header.update_hash();
        assert_ne!(header.hash(), original);

        header.timestamp -= 10;
        header.update_hash();
        assert_eq!(header.hash(), original);
    }

    #[test]
    fn set_pre_block_links_and_numbers() {
        let genesis = BlockHeader::genesis(1_700_000_000, Some(test_address(1)));

        let mut next = BlockHeader::new(genesis.timestamp + 10, Some(test_address(2)));
        next.set_pre_block(&genesis);

        assert_eq!(next.number, 1);
        assert_eq!(next.previous_hash, genesis.hash());
        assert_ne!(next.hash(), genesis.hash());
    }

    #[test]
    fn chain_of_headers_links_pairwise() {
        let mut headers = vec![BlockHeader::genesis(1_000, None)];
        for i in 1..=5u64 {
            let mut header = BlockHeader::new(1_000 + i * 10, None);
            header.set_pre_block(headers.last().unwrap());
            headers.push(header);
        }

        for pair in headers.windows(2) {
            assert_eq!(pair[1].number, pair[0].number + 1);
            assert_eq!(pair[1].previous_hash, pair[0].hash());
        }
    }

    #[test]
    fn coinbase_affects_hash() {
        let with = BlockHeader::genesis(1_000, Some(test_address(1)));
        let without = BlockHeader::genesis(1_000, None);
        assert_ne!(with.hash(), without.hash());
    }
}

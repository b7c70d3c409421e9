//! Candidate and miner set bookkeeping.
//!
//! The engine owns the storage representation of the validator candidate
//! list and the elected miner set; election itself happens in the consensus
//! layer above. Candidates enter and leave only through [`register`] /
//! [`unregister`] on the per-block host context.
//!
//! [`register`]: CandidateRegistry::register
//! [`unregister`]: CandidateRegistry::unregister

use crate::core::error::{ExecutionError, RegisterError};
use crate::storage::{state_key, StateStorage, StorageError};
use crate::types::address::Address;
use crate::types::encoding::{Decode, Encode};
use crate::types::hash::Hash;
use valuechain_derive::BinaryCodec;

/// Database name for consensus-owned state.
pub const DB_CONSENSUS: &str = "consensus";

const TABLE_CANDIDATES: &str = "candidates";
const TABLE_MINERS: &str = "miners";
const LIST_ITEM: &[u8] = b"list";

/// One registered validator candidate.
#[derive(Clone, Debug, PartialEq, Eq, BinaryCodec)]
pub struct CandidateEntry {
    /// Candidate account.
    pub address: Address,
    /// Block number of the latest registration or refresh.
    pub registered_at: u64,
}

/// Storage-backed access to the candidate list and elected miner set.
pub struct CandidateRegistry<'a> {
    storage: &'a dyn StateStorage,
    max_validator: u32,
}

impl<'a> CandidateRegistry<'a> {
    /// Creates a registry bound to the given storage.
    pub fn new(storage: &'a dyn StateStorage, max_validator: u32) -> Self {
        Self {
            storage,
            max_validator,
        }
    }

    fn candidates_key() -> Hash {
        state_key(DB_CONSENSUS, TABLE_CANDIDATES, LIST_ITEM)
    }

    pub(crate) fn miners_key() -> Hash {
        state_key(DB_CONSENSUS, TABLE_MINERS, LIST_ITEM)
    }

    /// Returns the current candidate list; empty before any registration.
    pub fn candidates(&self) -> Result<Vec<CandidateEntry>, StorageError> {
        match self.storage.get(Self::candidates_key())? {
            Some(bytes) => Vec::<CandidateEntry>::from_bytes(&bytes)
                .map_err(|_| StorageError::Corrupted("candidate list".to_string())),
            None => Ok(Vec::new()),
        }
    }

    fn store_candidates(&self, entries: &Vec<CandidateEntry>) -> Result<(), StorageError> {
        self.storage.put(Self::candidates_key(), entries.to_bytes())
    }

    /// Adds or refreshes a candidate's eligibility as of `block_number`.
    ///
    /// Re-registering an existing candidate only bumps its `registered_at`;
    /// a new candidate is rejected once `max_validator` entries exist.
    pub fn register(&self, block_number: u64, address: Address) -> Result<(), RegisterError> {
        let mut entries = self.candidates().map_err(RegisterError::Storage)?;

        if let Some(entry) = entries.iter_mut().find(|e| e.address == address) {
            entry.registered_at = block_number;
        } else {
            if entries.len() >= self.max_validator as usize {
                return Err(RegisterError::LimitReached(self.max_validator));
            }
            entries.push(CandidateEntry {
                address,
                registered_at: block_number,
            });
        }

        self.store_candidates(&entries)?;
        Ok(())
    }

    /// Removes a candidate; returns whether it was present. Idempotent.
    pub fn unregister(&self, address: Address) -> Result<bool, StorageError> {
        let mut entries = self.candidates()?;
        let before = entries.len();
        entries.retain(|e| e.address != address);
        if entries.len() == before {
            return Ok(false);
        }
        self.store_candidates(&entries)?;
        Ok(true)
    }

    /// Returns the elected miner set at this point of the chain.
    ///
    /// The set is written at genesis and maintained by the consensus layer;
    /// a missing or undecodable entry is an invariant violation surfaced as
    /// an engine fault, never as a business return code.
    pub fn miners(&self) -> Result<Vec<Address>, ExecutionError> {
        match self
            .storage
            .get(Self::miners_key())
            .map_err(ExecutionError::Storage)?
        {
            Some(bytes) => Vec::<Address>::from_bytes(&bytes)
                .map_err(|_| ExecutionError::CorruptState("miner set undecodable".to_string())),
            None => Err(ExecutionError::CorruptState(
                "miner set missing".to_string(),
            )),
        }
    }

    /// Membership test against [`miners`].
    ///
    /// [`miners`]: CandidateRegistry::miners
    pub fn is_miner(&self, address: Address) -> Result<bool, ExecutionError> {
        Ok(self.miners()?.contains(&address))
    }

    /// Writes the miner set. Genesis seeding only.
    pub(crate) fn set_miners(&self, miners: &Vec<Address>) -> Result<(), StorageError> {
        self.storage.put(Self::miners_key(), miners.to_bytes())
    }

    /// Writes the candidate list wholesale. Genesis seeding only.
    pub(crate) fn set_candidates(&self, entries: &Vec<CandidateEntry>) -> Result<(), StorageError> {
        self.store_candidates(entries)
    }
}

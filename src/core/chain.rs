//! Chain-wide configuration and the executor factory.

use crate::consensus::candidates::{CandidateEntry, CandidateRegistry};
use crate::consensus::host::HostContext;
use crate::core::balances::BalanceStore;
use crate::core::error::ExecutionError;
use crate::core::executor::{BlockExecutor, ViewExecutor};
use crate::core::handler::ChainHandler;
use crate::core::header::BlockHeader;
use crate::core::value::ParamValue;
use crate::info;
use crate::storage::StateStorage;
use crate::types::address::Address;
use crate::types::balance::Balance;
use valuechain_derive::Error;

/// Chain-wide consensus parameters.
///
/// Set once when the chain is created and validated by
/// [`GlobalOptions::validate`] before anything else runs; the engine trusts
/// them afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlobalOptions {
    /// Minimum size of the elected validator set.
    pub min_validator: u32,
    /// Maximum number of registered candidates.
    pub max_validator: u32,
    /// Blocks between validator re-elections.
    pub re_selection_blocks: u64,
    /// Target seconds between blocks.
    pub block_interval: u64,
    /// Blocks a fresh candidate waits before it can be elected.
    pub min_wait_blocks_to_miner: u64,
    /// Account allowed to run privileged governance methods.
    pub super_admin: Address,
    /// Required approval rate for governance votes, in basis points.
    pub agree_rate_bps: u16,
    /// Escrow account for in-flight principal; also the default reward
    /// recipient when a header carries no coinbase.
    pub system_address: Address,
}

/// Rejected configuration values.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("min_validator must be at least 1")]
    MinValidatorZero,
    #[error("max_validator {max} is below min_validator {min}")]
    ValidatorRangeInverted { min: u32, max: u32 },
    #[error("re_selection_blocks must be at least 1")]
    ReSelectionZero,
    #[error("block_interval must be at least 1 second")]
    BlockIntervalZero,
    #[error("agree_rate_bps {0} exceeds 10000")]
    AgreeRateOutOfRange(u16),
    #[error("system_address must not be the zero address")]
    SystemAddressZero,
}

impl GlobalOptions {
    /// Checks internal consistency. Run once at chain creation.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.min_validator == 0 {
            return Err(OptionsError::MinValidatorZero);
        }
        if self.max_validator < self.min_validator {
            return Err(OptionsError::ValidatorRangeInverted {
                min: self.min_validator,
                max: self.max_validator,
            });
        }
        if self.re_selection_blocks == 0 {
            return Err(OptionsError::ReSelectionZero);
        }
        if self.block_interval == 0 {
            return Err(OptionsError::BlockIntervalZero);
        }
        if self.agree_rate_bps > 10_000 {
            return Err(OptionsError::AgreeRateOutOfRange(self.agree_rate_bps));
        }
        if self.system_address == Address::zero() {
            return Err(OptionsError::SystemAddressZero);
        }
        Ok(())
    }

    /// Returns deterministic development parameters.
    ///
    /// The system and admin addresses are derived from fixed seeds, so every
    /// test run sees the same configuration.
    pub fn dev() -> Self {
        use crate::crypto::key_pair::PrivateKey;
        Self {
            min_validator: 1,
            max_validator: 21,
            re_selection_blocks: 100,
            block_interval: 10,
            min_wait_blocks_to_miner: 2,
            super_admin: PrivateKey::from_seed(b"dev-super-admin").address(),
            agree_rate_bps: 6_667,
            system_address: PrivateKey::from_seed(b"dev-system-address").address(),
        }
    }
}

/// Initial state written when a chain is created.
#[derive(Clone, Debug, Default)]
pub struct GenesisOptions {
    /// Genesis header timestamp, epoch seconds.
    pub timestamp: u64,
    /// Genesis coinbase.
    pub coinbase: Option<Address>,
    /// Balances credited before any block executes.
    pub pre_balances: Vec<(Address, Balance)>,
    /// Validator candidates registered as of block 0.
    pub candidates: Vec<Address>,
    /// Initial elected miner set. Always written, even when empty, because a
    /// missing miner set reads as corrupt state afterwards.
    pub miners: Vec<Address>,
}

/// The execution engine's front door.
///
/// Owns the validated configuration and the handler registry, and builds the
/// per-block executors with their host-context wiring. Consensus, networking
/// and persistence live in the layers above; they call in here to apply
/// state transitions.
pub struct Chain {
    options: GlobalOptions,
    handler: ChainHandler,
}

impl Chain {
    /// Creates a chain after validating `options`.
    pub fn new(options: GlobalOptions, handler: ChainHandler) -> Result<Self, OptionsError> {
        options.validate()?;
        Ok(Self { options, handler })
    }

    /// The validated chain options.
    pub fn options(&self) -> &GlobalOptions {
        &self.options
    }

    /// The handler registry.
    pub fn handler(&self) -> &ChainHandler {
        &self.handler
    }

    /// Builds the block executor for `header`, wiring a fresh host context.
    pub fn new_block_executor<'a>(
        &'a self,
        header: &'a BlockHeader,
        storage: &'a dyn StateStorage,
    ) -> BlockExecutor<'a> {
        let host = HostContext::new(storage, &self.options, header.number);
        BlockExecutor::new(header, storage, &self.handler, &self.options, host)
    }

    /// Builds a read-only view executor for `header`.
    pub fn new_view_executor<'a>(
        &'a self,
        header: &'a BlockHeader,
        storage: &'a dyn StateStorage,
        method: impl Into<String>,
        params: ParamValue,
    ) -> ViewExecutor<'a> {
        let host = HostContext::new(storage, &self.options, header.number);
        ViewExecutor::new(&self.handler, host, method.into(), params)
    }

    /// Writes genesis state and returns the height-0 header.
    ///
    /// Seeds pre-balances, the candidate list, and the miner set, then logs
    /// the resulting header hash.
    pub fn create_genesis(
        &self,
        storage: &dyn StateStorage,
        genesis: GenesisOptions,
    ) -> Result<BlockHeader, ExecutionError> {
        let balances = BalanceStore::new(storage, self.options.system_address);
        for (address, amount) in &genesis.pre_balances {
            balances.issue(*address, *amount)?;
        }

        let registry = CandidateRegistry::new(storage, self.options.max_validator);
        let entries: Vec<CandidateEntry> = genesis
            .candidates
            .iter()
            .map(|address| CandidateEntry {
                address: *address,
                registered_at: 0,
            })
            .collect();
        registry.set_candidates(&entries)?;
        registry.set_miners(&genesis.miners)?;

        let header = BlockHeader::genesis(genesis.timestamp, genesis.coinbase);
        info!(
            "genesis created: hash {}, {} pre-funded accounts, {} miners",
            header.hash(),
            genesis.pre_balances.len(),
            genesis.miners.len()
        );
        Ok(header)
    }
}

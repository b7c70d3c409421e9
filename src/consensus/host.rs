//! Per-block host capabilities exposed to method bodies.

use crate::consensus::candidates::CandidateRegistry;
use crate::core::balances::BalanceStore;
use crate::core::chain::GlobalOptions;
use crate::core::error::{ExecutionError, RegisterError};
use crate::storage::StateStorage;
use crate::types::address::Address;
use crate::types::balance::Balance;

/// The only chain capabilities a method body can reach.
///
/// Built fresh for each block header and handed to handlers by reference, so
/// there is no hidden captured state: everything a handler can observe or
/// mutate goes through this interface, and every mutation lands in the
/// storage scope the executor currently has open. All other chain state is
/// opaque to method bodies.
pub struct HostContext<'a> {
    balances: BalanceStore<'a>,
    candidates: CandidateRegistry<'a>,
    block_number: u64,
    system_address: Address,
}

impl<'a> HostContext<'a> {
    /// Wires the host context for one block.
    pub(crate) fn new(
        storage: &'a dyn StateStorage,
        options: &GlobalOptions,
        block_number: u64,
    ) -> Self {
        Self {
            balances: BalanceStore::new(storage, options.system_address),
            candidates: CandidateRegistry::new(storage, options.max_validator),
            block_number,
            system_address: options.system_address,
        }
    }

    /// Number of the block being executed.
    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    /// Returns the balance of `address`; zero for unknown addresses.
    pub fn balance(&self, address: Address) -> Result<Balance, ExecutionError> {
        self.balances.balance(address).map_err(ExecutionError::from)
    }

    /// Pays `amount` out of the system escrow to `address`.
    ///
    /// This is how method bodies redistribute escrowed principal; they have
    /// no way to debit arbitrary accounts.
    pub fn transfer_to(&self, address: Address, amount: Balance) -> Result<(), ExecutionError> {
        self.balances
            .transfer_to(self.system_address, address, amount)
    }

    /// Adds or refreshes `address` as a validator candidate as of this block.
    pub fn register(&self, address: Address) -> Result<(), RegisterError> {
        self.candidates.register(self.block_number, address)
    }

    /// Removes `address` from the candidate list; idempotent.
    pub fn unregister(&self, address: Address) -> Result<bool, ExecutionError> {
        self.candidates
            .unregister(address)
            .map_err(ExecutionError::from)
    }

    /// Returns the elected miner set at this header.
    ///
    /// Fails with an engine fault, not a return code, when the underlying
    /// read fails.
    pub fn miners(&self) -> Result<Vec<Address>, ExecutionError> {
        self.candidates.miners()
    }

    /// Membership test against [`miners`].
    ///
    /// [`miners`]: HostContext::miners
    pub fn is_miner(&self, address: Address) -> Result<bool, ExecutionError> {
        self.candidates.is_miner(address)
    }
}

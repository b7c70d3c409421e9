//! Address-to-balance bookkeeping over the state storage.

use crate::core::error::ExecutionError;
use crate::storage::{state_key, StateStorage, StorageError, DB_SYSTEM};
use crate::types::address::Address;
use crate::types::balance::Balance;
use crate::types::encoding::{Decode, Encode};
use crate::types::hash::Hash;

/// Balance table name under the system database.
const TABLE_BALANCE: &str = "balance";
/// Account nonce table name under the system database.
const TABLE_NONCE: &str = "nonce";

/// Balance and nonce accounting for all addresses.
///
/// Total supply is conserved by every operation except [`issue`]: a transfer
/// debits and credits the exact same amount, with one carve-out - the system
/// address acts as an unconstrained source, so transfers out of it skip the
/// funds check (its own balance saturates at zero). Writes go through the
/// storage handle and therefore land inside whatever scope is currently
/// open.
///
/// [`issue`]: BalanceStore::issue
pub struct BalanceStore<'a> {
    storage: &'a dyn StateStorage,
    system_address: Address,
}

impl<'a> BalanceStore<'a> {
    /// Creates a store bound to the given storage and system address.
    pub fn new(storage: &'a dyn StateStorage, system_address: Address) -> Self {
        Self {
            storage,
            system_address,
        }
    }

    fn balance_key(address: Address) -> Hash {
        state_key(DB_SYSTEM, TABLE_BALANCE, address.as_slice())
    }

    fn nonce_key(address: Address) -> Hash {
        state_key(DB_SYSTEM, TABLE_NONCE, address.as_slice())
    }

    /// Returns the balance of `address`; unknown addresses hold zero.
    pub fn balance(&self, address: Address) -> Result<Balance, StorageError> {
        match self.storage.get(Self::balance_key(address))? {
            Some(bytes) => Balance::from_bytes(&bytes).map_err(|_| {
                StorageError::Corrupted(format!("balance entry for {}", address))
            }),
            None => Ok(Balance::zero()),
        }
    }

    fn set_balance(&self, address: Address, amount: Balance) -> Result<(), StorageError> {
        self.storage
            .put(Self::balance_key(address), amount.to_bytes())
    }

    /// Moves `amount` from `from` to `to`.
    ///
    /// Fails with `InsufficientFunds` when `from` cannot cover the amount,
    /// unless `from` is the system address. A self-transfer with sufficient
    /// funds is a no-op.
    pub fn transfer_to(
        &self,
        from: Address,
        to: Address,
        amount: Balance,
    ) -> Result<(), ExecutionError> {
        let from_balance = self.balance(from)?;

        let new_from = if from == self.system_address {
            from_balance.saturating_sub(amount)
        } else {
            from_balance
                .checked_sub(amount)
                .ok_or(ExecutionError::InsufficientFunds {
                    balance: from_balance,
                    required: amount,
                })?
        };

        if from == to {
            return Ok(());
        }
        self.set_balance(from, new_from)?;

        let to_balance = self.balance(to)?;
        let new_to = to_balance.checked_add(amount).ok_or_else(|| {
            ExecutionError::Storage(StorageError::Corrupted(format!(
                "balance overflow crediting {}",
                to
            )))
        })?;
        self.set_balance(to, new_to)?;
        Ok(())
    }

    /// Credits `amount` to `to` out of thin air.
    ///
    /// The sole supply-increasing operation. Crate-private so only the
    /// pre-block wage event and genesis seeding can reach it.
    pub(crate) fn issue(&self, to: Address, amount: Balance) -> Result<(), ExecutionError> {
        let current = self.balance(to)?;
        let updated = current.checked_add(amount).ok_or_else(|| {
            ExecutionError::Storage(StorageError::Corrupted(format!(
                "balance overflow issuing to {}",
                to
            )))
        })?;
        self.set_balance(to, updated)?;
        Ok(())
    }

    /// Returns the stored nonce of `address`; unknown addresses hold 0.
    pub fn nonce(&self, address: Address) -> Result<u64, StorageError> {
        match self.storage.get(Self::nonce_key(address))? {
            Some(bytes) => u64::from_bytes(&bytes)
                .map_err(|_| StorageError::Corrupted(format!("nonce entry for {}", address))),
            None => Ok(0),
        }
    }

    /// Records a new nonce for `address`.
    pub fn set_nonce(&self, address: Address, nonce: u64) -> Result<(), StorageError> {
        self.storage.put(Self::nonce_key(address), nonce.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;
    use crate::utils::test_utils::utils::test_address;

    fn setup() -> (MemoryStorage, Address) {
        (MemoryStorage::new(), test_address(255))
    }

    #[test]
    fn unknown_address_has_zero_balance() {
        let (storage, sys) = setup();
        let balances = BalanceStore::new(&storage, sys);
        assert_eq!(balances.balance(test_address(1)).unwrap(), Balance::zero());
    }

    #[test]
    fn transfer_moves_exact_amount() {
        let (storage, sys) = setup();
        let balances = BalanceStore::new(&storage, sys);
        let (a, b) = (test_address(1), test_address(2));

        balances.issue(a, Balance::new(100)).unwrap();
        balances.transfer_to(a, b, Balance::new(30)).unwrap();

        assert_eq!(balances.balance(a).unwrap(), Balance::new(70));
        assert_eq!(balances.balance(b).unwrap(), Balance::new(30));
    }

    #[test]
    fn transfer_rejects_insufficient_funds() {
        let (storage, sys) = setup();
        let balances = BalanceStore::new(&storage, sys);
        let (a, b) = (test_address(1), test_address(2));

        balances.issue(a, Balance::new(5)).unwrap();
        let err = balances.transfer_to(a, b, Balance::new(10)).unwrap_err();
        assert_eq!(
            err,
            ExecutionError::InsufficientFunds {
                balance: Balance::new(5),
                required: Balance::new(10),
            }
        );

        // No partial effects.
        assert_eq!(balances.balance(a).unwrap(), Balance::new(5));
        assert_eq!(balances.balance(b).unwrap(), Balance::zero());
    }

    #[test]
    fn system_address_is_unconstrained_source() {
        let (storage, sys) = setup();
        let balances = BalanceStore::new(&storage, sys);
        let receiver = test_address(1);

        // System holds nothing, yet the transfer goes through.
        balances.transfer_to(sys, receiver, Balance::new(40)).unwrap();
        assert_eq!(balances.balance(receiver).unwrap(), Balance::new(40));
        assert_eq!(balances.balance(sys).unwrap(), Balance::zero());
    }

    #[test]
    fn self_transfer_is_noop() {
        let (storage, sys) = setup();
        let balances = BalanceStore::new(&storage, sys);
        let a = test_address(1);

        balances.issue(a, Balance::new(50)).unwrap();
        balances.transfer_to(a, a, Balance::new(20)).unwrap();
        assert_eq!(balances.balance(a).unwrap(), Balance::new(50));
    }

    #[test]
    fn conservation_over_transfer_sequences() {
        let (storage, sys) = setup();
        let balances = BalanceStore::new(&storage, sys);
        let accounts: Vec<Address> = (1..=4).map(test_address).collect();

        for account in &accounts {
            balances.issue(*account, Balance::new(1_000)).unwrap();
        }
        let total = |balances: &BalanceStore| -> Balance {
            accounts
                .iter()
                .map(|a| balances.balance(*a).unwrap())
                .sum()
        };
        let initial = total(&balances);

        // A few arbitrary transfers between non-system accounts.
        balances
            .transfer_to(accounts[0], accounts[1], Balance::new(137))
            .unwrap();
        balances
            .transfer_to(accounts[1], accounts[2], Balance::new(999))
            .unwrap();
        balances
            .transfer_to(accounts[3], accounts[0], Balance::new(1))
            .unwrap();

        assert_eq!(total(&balances), initial);
    }

    #[test]
    fn issue_increases_supply() {
        let (storage, sys) = setup();
        let balances = BalanceStore::new(&storage, sys);
        let a = test_address(1);

        balances.issue(a, Balance::new(10)).unwrap();
        balances.issue(a, Balance::new(15)).unwrap();
        assert_eq!(balances.balance(a).unwrap(), Balance::new(25));
    }

    #[test]
    fn nonce_defaults_to_zero_and_updates() {
        let (storage, sys) = setup();
        let balances = BalanceStore::new(&storage, sys);
        let a = test_address(1);

        assert_eq!(balances.nonce(a).unwrap(), 0);
        balances.set_nonce(a, 1).unwrap();
        assert_eq!(balances.nonce(a).unwrap(), 1);
    }

    #[test]
    fn corrupted_balance_entry_is_engine_fault() {
        let (storage, sys) = setup();
        let a = test_address(1);
        storage
            .put(BalanceStore::balance_key(a), vec![1, 2, 3])
            .unwrap();

        let balances = BalanceStore::new(&storage, sys);
        assert!(matches!(
            balances.balance(a),
            Err(StorageError::Corrupted(_))
        ));
    }
}

//! Deterministic in-memory debug sessions.
//!
//! A [`MemoryDebugSession`] replays transactions, wage events, and view
//! queries against an isolated [`MemoryStorage`], with a synthetic header
//! chain and synthetic signing accounts instead of a live network. Every
//! session starts from a clean slate; nothing touches disk or peers.

use crate::core::chain::{Chain, GenesisOptions};
use crate::core::error::ExecutionError;
use crate::core::executor::ExecuteOptions;
use crate::core::header::BlockHeader;
use crate::core::receipt::Receipt;
use crate::core::transaction::Transaction;
use crate::core::value::ParamValue;
use crate::crypto::key_pair::PrivateKey;
use crate::error;
use crate::storage::memory::MemoryStorage;
use crate::types::address::Address;
use crate::types::balance::Balance;
use std::time::{SystemTime, UNIX_EPOCH};

/// How a session obtains its signing accounts.
pub enum AccountSetup {
    /// Derive this many accounts from fixed seeds, reproducibly.
    Count(usize),
    /// Use externally supplied keys.
    Keys(Vec<PrivateKey>),
}

/// Session construction parameters.
pub struct SessionOptions {
    /// Signing accounts available to the session.
    pub accounts: AccountSetup,
    /// Seconds between consecutive synthetic headers.
    pub interval: u64,
    /// Extend the chain to this height right after genesis; 0 stays at
    /// genesis.
    pub height: u64,
    /// Account index whose address becomes each header's coinbase.
    pub coinbase: usize,
    /// Balance credited to every account at genesis.
    pub pre_balance: Option<Balance>,
    /// Account indexes seeded as the elected miner set.
    pub miners: Vec<usize>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            accounts: AccountSetup::Count(4),
            interval: 10,
            height: 0,
            coinbase: 0,
            pre_balance: None,
            miners: Vec::new(),
        }
    }
}

/// Parameters for a synthetic transaction.
///
/// The fee is fixed at zero in debug mode and the nonce check is bypassed,
/// so transactions can be injected in any order.
pub struct TransactionOptions {
    /// Index of the signing account.
    pub caller: usize,
    /// Method name to invoke.
    pub method: String,
    /// Method input.
    pub input: ParamValue,
    /// Principal to escrow.
    pub value: Balance,
}

/// An isolated execution session over in-memory state.
pub struct MemoryDebugSession {
    chain: Chain,
    storage: MemoryStorage,
    accounts: Vec<PrivateKey>,
    interval: u64,
    /// Full synthetic header chain, genesis first.
    headers: Vec<BlockHeader>,
}

impl MemoryDebugSession {
    /// Creates a session: fresh storage, synthetic accounts, genesis at the
    /// current time, and an optional deterministic chain extension.
    pub fn init(chain: Chain, options: SessionOptions) -> Result<Self, ExecutionError> {
        let accounts = match options.accounts {
            AccountSetup::Count(count) => (0..count)
                .map(|i| PrivateKey::from_seed(format!("debug-account-{}", i).as_bytes()))
                .collect(),
            AccountSetup::Keys(keys) => keys,
        };
        if accounts.is_empty() {
            return Err(ExecutionError::InvalidParam(
                "session needs at least one account".to_string(),
            ));
        }
        if options.coinbase >= accounts.len() {
            return Err(ExecutionError::InvalidParam(format!(
                "coinbase index {} out of range",
                options.coinbase
            )));
        }

        let storage = MemoryStorage::new();

        let pre_balances = match options.pre_balance {
            Some(amount) => accounts.iter().map(|key| (key.address(), amount)).collect(),
            None => Vec::new(),
        };
        let miners = options
            .miners
            .iter()
            .map(|&index| {
                accounts
                    .get(index)
                    .map(PrivateKey::address)
                    .ok_or_else(|| {
                        ExecutionError::InvalidParam(format!("miner index {} out of range", index))
                    })
            })
            .collect::<Result<Vec<Address>, _>>()?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let coinbase_address = accounts[options.coinbase].address();
        let genesis = chain.create_genesis(
            &storage,
            GenesisOptions {
                timestamp: now,
                coinbase: Some(coinbase_address),
                pre_balances,
                candidates: Vec::new(),
                miners,
            },
        )?;

        let mut session = Self {
            chain,
            storage,
            accounts,
            interval: options.interval,
            headers: vec![genesis],
        };
        if options.height > 0 {
            session.update_height_to(options.height, options.coinbase)?;
        }
        Ok(session)
    }

    /// The header currently at the tip of the synthetic chain.
    pub fn current_header(&self) -> &BlockHeader {
        self.headers.last().expect("session always has a genesis header")
    }

    /// The full synthetic header chain, genesis first.
    pub fn headers(&self) -> &[BlockHeader] {
        &self.headers
    }

    /// The chain this session executes against.
    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Address of the signing account at `index`.
    pub fn account(&self, index: usize) -> Option<Address> {
        self.accounts.get(index).map(PrivateKey::address)
    }

    /// Extends the header chain to `height`, one header per step.
    ///
    /// Each new header's timestamp advances by exactly the session interval
    /// and its coinbase is the account at `coinbase`. Fails when `height`
    /// does not exceed the current tip.
    pub fn update_height_to(&mut self, height: u64, coinbase: usize) -> Result<(), ExecutionError> {
        let current = self.current_header();
        if height <= current.number {
            error!(
                "update_height_to {} rejected: current height {} is not below it",
                height, current.number
            );
            return Err(ExecutionError::InvalidParam(format!(
                "height {} not above current {}",
                height, current.number
            )));
        }
        let coinbase_address = self.account(coinbase).ok_or_else(|| {
            ExecutionError::InvalidParam(format!("coinbase index {} out of range", coinbase))
        })?;

        while self.current_header().number < height {
            let previous = self.current_header().clone();
            let mut header =
                BlockHeader::new(previous.timestamp + self.interval, Some(coinbase_address));
            header.set_pre_block(&previous);
            self.headers.push(header);
        }
        Ok(())
    }

    /// Builds, signs, and executes a synthetic transaction at the tip.
    ///
    /// Fee is zero and the nonce check is bypassed (`ignore_nonce`), so
    /// calls can be replayed and reordered freely while testing.
    pub fn transaction(&self, options: TransactionOptions) -> Result<Receipt, ExecutionError> {
        let key = self.accounts.get(options.caller).ok_or_else(|| {
            ExecutionError::InvalidParam(format!("caller index {} out of range", options.caller))
        })?;
        let tx = Transaction::new(
            options.method,
            options.input,
            options.value,
            Balance::zero(),
            0,
            key,
        );

        let header = self.current_header();
        let executor = self.chain.new_block_executor(header, &self.storage);
        executor.execute_transaction(&tx, ExecuteOptions { ignore_nonce: true })
    }

    /// Runs the miner wage event at the tip.
    pub fn wage(&self) -> Result<(), ExecutionError> {
        let header = self.current_header();
        let executor = self.chain.new_block_executor(header, &self.storage);
        executor.execute_miner_wage_event()
    }

    /// Runs a view method at the tip.
    pub fn view(&self, method: &str, params: ParamValue) -> Result<ParamValue, ExecutionError> {
        let header = self.current_header();
        self.chain
            .new_view_executor(header, &self.storage, method, params)
            .execute()
    }

    /// Reads a balance directly, for assertions.
    pub fn balance(&self, address: Address) -> Result<Balance, ExecutionError> {
        use crate::core::balances::BalanceStore;
        BalanceStore::new(&self.storage, self.chain.options().system_address)
            .balance(address)
            .map_err(ExecutionError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::host::HostContext;
    use crate::core::handler::{CallFrame, ChainHandler};
    use crate::core::receipt::RETURN_OK;
    use crate::utils::test_utils::utils::dev_options;

    fn debug_chain() -> Chain {
        let mut handler = ChainHandler::new();

        handler.register_method(
            "transfer",
            |frame: &mut CallFrame<'_, '_>, input: &ParamValue| -> Result<u32, ExecutionError> {
                let to = match input.get("to").and_then(ParamValue::as_address) {
                    Some(to) => to,
                    None => return Ok(1),
                };
                frame.host.transfer_to(to, frame.value)?;
                Ok(RETURN_OK)
            },
        );

        handler.register_view(
            "get_balance",
            |host: &HostContext<'_>, params: &ParamValue| -> Result<ParamValue, ExecutionError> {
                let address = params
                    .get("address")
                    .and_then(ParamValue::as_address)
                    .ok_or_else(|| ExecutionError::InvalidParam("address required".to_string()))?;
                Ok(ParamValue::Amount(host.balance(address)?))
            },
        );

        handler.register_view(
            "get_miners",
            |host: &HostContext<'_>, _: &ParamValue| -> Result<ParamValue, ExecutionError> {
                let miners = host.miners()?;
                Ok(ParamValue::List(
                    miners.into_iter().map(ParamValue::Address).collect(),
                ))
            },
        );

        handler.set_miner_wage(|_| Balance::new(800));
        Chain::new(dev_options(), handler).unwrap()
    }

    fn session(height: u64) -> MemoryDebugSession {
        MemoryDebugSession::init(
            debug_chain(),
            SessionOptions {
                accounts: AccountSetup::Count(3),
                interval: 10,
                height,
                coinbase: 0,
                pre_balance: Some(Balance::new(10_000)),
                miners: vec![0],
            },
        )
        .unwrap()
    }

    #[test]
    fn init_extends_chain_to_requested_height() {
        let session = session(5);
        assert_eq!(session.current_header().number, 5);
        assert_eq!(session.headers().len(), 6);
    }

    #[test]
    fn header_chain_links_and_spaces_timestamps() {
        let session = session(4);

        for pair in session.headers().windows(2) {
            assert_eq!(pair[1].number, pair[0].number + 1);
            assert_eq!(pair[1].previous_hash, pair[0].hash());
            assert_eq!(pair[1].timestamp, pair[0].timestamp + 10);
        }
    }

    #[test]
    fn update_height_must_exceed_current() {
        let mut session = session(3);
        let err = session.update_height_to(3, 0).unwrap_err();
        assert!(matches!(err, ExecutionError::InvalidParam(_)));

        session.update_height_to(7, 1).unwrap();
        assert_eq!(session.current_header().number, 7);
        assert_eq!(
            session.current_header().coinbase,
            Some(session.account(1).unwrap())
        );
    }

    #[test]
    fn transactions_execute_with_zero_fee_and_no_nonce() {
        let session = session(1);
        let from = session.account(1).unwrap();
        let to = session.account(2).unwrap();

        let receipt = session
            .transaction(TransactionOptions {
                caller: 1,
                method: "transfer".to_string(),
                input: ParamValue::map([("to", to.into())]),
                value: Balance::new(2_500),
            })
            .unwrap();
        assert!(receipt.succeeded());

        assert_eq!(session.balance(from).unwrap(), Balance::new(7_500));
        assert_eq!(session.balance(to).unwrap(), Balance::new(12_500));

        // No fee was charged and the coinbase earned nothing.
        let coinbase = session.account(0).unwrap();
        assert_eq!(session.balance(coinbase).unwrap(), Balance::new(10_000));
    }

    #[test]
    fn replayed_transactions_are_accepted() {
        let session = session(1);
        let to = session.account(2).unwrap();

        for _ in 0..3 {
            session
                .transaction(TransactionOptions {
                    caller: 1,
                    method: "transfer".to_string(),
                    input: ParamValue::map([("to", to.into())]),
                    value: Balance::new(100),
                })
                .unwrap();
        }
        assert_eq!(session.balance(to).unwrap(), Balance::new(10_300));
    }

    #[test]
    fn wage_credits_coinbase_without_transactions() {
        let session = session(2);
        let coinbase = session.account(0).unwrap();

        session.wage().unwrap();
        assert_eq!(session.balance(coinbase).unwrap(), Balance::new(10_800));

        session.wage().unwrap();
        assert_eq!(session.balance(coinbase).unwrap(), Balance::new(11_600));
    }

    #[test]
    fn views_answer_from_current_state() {
        let session = session(1);
        let account = session.account(2).unwrap();

        let result = session
            .view(
                "get_balance",
                ParamValue::map([("address", account.into())]),
            )
            .unwrap();
        assert_eq!(result, ParamValue::Amount(Balance::new(10_000)));
    }

    #[test]
    fn seeded_miners_are_visible_through_views() {
        let session = session(0);
        let miner = session.account(0).unwrap();

        let result = session.view("get_miners", ParamValue::Null).unwrap();
        assert_eq!(result, ParamValue::List(vec![ParamValue::Address(miner)]));
    }

    #[test]
    fn sessions_are_isolated() {
        let a = session(1);
        let b = session(1);
        let target = a.account(2).unwrap();

        a.transaction(TransactionOptions {
            caller: 1,
            method: "transfer".to_string(),
            input: ParamValue::map([("to", target.into())]),
            value: Balance::new(500),
        })
        .unwrap();

        // Session b never saw a's transfer.
        assert_eq!(b.balance(target).unwrap(), Balance::new(10_000));
    }

    #[test]
    fn out_of_range_indexes_rejected() {
        let session = session(0);
        assert!(matches!(
            session.transaction(TransactionOptions {
                caller: 99,
                method: "transfer".to_string(),
                input: ParamValue::Null,
                value: Balance::zero(),
            }),
            Err(ExecutionError::InvalidParam(_))
        ));

        let bad = MemoryDebugSession::init(
            debug_chain(),
            SessionOptions {
                accounts: AccountSetup::Count(2),
                coinbase: 5,
                ..SessionOptions::default()
            },
        );
        assert!(matches!(bad, Err(ExecutionError::InvalidParam(_))));
    }
}

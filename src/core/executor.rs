//! Transaction, block, and view execution.
//!
//! The execution pipeline is strictly sequential: within a block, each
//! transaction is fully settled (its storage scope committed or rolled back,
//! its fee paid) before the next begins, so later transactions always
//! observe earlier ones' final state. At most one storage scope is open at
//! any time, and every exit path out of [`TransactionExecutor::execute`]
//! resolves it.

use crate::consensus::host::HostContext;
use crate::core::balances::BalanceStore;
use crate::core::chain::GlobalOptions;
use crate::core::error::ExecutionError;
use crate::core::handler::{BlockListener, CallFrame, ChainHandler};
use crate::core::header::BlockHeader;
use crate::core::receipt::{Receipt, RETURN_OK};
use crate::core::transaction::Transaction;
use crate::core::value::ParamValue;
use crate::storage::StateStorage;
use crate::types::address::Address;
use crate::{info, warn};

/// Per-call execution switches.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExecuteOptions {
    /// Skips the nonce check and the nonce record.
    ///
    /// Debug-harness override for injecting synthetic transactions out of
    /// nonce order; never set on a live chain.
    pub ignore_nonce: bool,
}

/// Applies one signed transaction to chain state.
pub struct TransactionExecutor<'a> {
    tx: &'a Transaction,
    handler: &'a ChainHandler,
    options: &'a GlobalOptions,
}

impl<'a> TransactionExecutor<'a> {
    /// Binds an executor to one transaction.
    pub fn new(tx: &'a Transaction, handler: &'a ChainHandler, options: &'a GlobalOptions) -> Self {
        Self {
            tx,
            handler,
            options,
        }
    }

    /// Runs the transaction against `storage` under `header`.
    ///
    /// Ordered steps, each short-circuiting on failure:
    ///
    /// 1. nonce check (`tx.nonce == stored + 1`), nonce recorded on success;
    /// 2. funds check (`balance >= value + fee`);
    /// 3. fee reservation onto the system address - outside the scope, so
    ///    the fee is charged whether or not the method body commits;
    /// 4. scoped escrow of the principal onto the system address;
    /// 5. method dispatch; nonzero return code or engine fault rolls the
    ///    scope back, success commits it;
    /// 6. fee payout from the system address to the coinbase (the system
    ///    address is an unconstrained source, so the payout cannot fail for
    ///    lack of funds);
    /// 7. receipt.
    ///
    /// Validation and engine faults return `Err` with no receipt; business
    /// failures return `Ok` with a nonzero receipt code.
    pub fn execute(
        &self,
        header: &BlockHeader,
        storage: &dyn StateStorage,
        host: &HostContext<'_>,
        opts: ExecuteOptions,
    ) -> Result<Receipt, ExecutionError> {
        let balances = BalanceStore::new(storage, self.options.system_address);
        let sender = self.tx.sender();

        if !opts.ignore_nonce {
            let stored = balances.nonce(sender)?;
            let expected = stored + 1;
            if self.tx.nonce != expected {
                warn!(
                    "tx {} rejected: nonce {} (expected {})",
                    self.tx.hash(),
                    self.tx.nonce,
                    expected
                );
                return Err(ExecutionError::InvalidNonce {
                    expected,
                    got: self.tx.nonce,
                });
            }
        }

        let balance = balances.balance(sender)?;
        let required = self
            .tx
            .value
            .checked_add(self.tx.fee)
            .ok_or_else(|| ExecutionError::InvalidParam("value + fee overflows".to_string()))?;
        if balance < required {
            warn!(
                "tx {} rejected: balance {} below required {}",
                self.tx.hash(),
                balance,
                required
            );
            return Err(ExecutionError::InsufficientFunds { balance, required });
        }

        // Resolve the handler before any state is touched, so an unknown
        // method leaves no trace.
        let method = self
            .handler
            .method(&self.tx.method)
            .ok_or_else(|| ExecutionError::UnknownMethod(self.tx.method.clone()))?;

        if !opts.ignore_nonce {
            balances.set_nonce(sender, self.tx.nonce)?;
        }

        // Fee reservation. Covered by the funds check above, and outside the
        // scope so a rolled-back body still pays.
        balances.transfer_to(sender, self.options.system_address, self.tx.fee)?;

        storage.begin_transaction()?;

        if let Err(err) = balances.transfer_to(sender, self.options.system_address, self.tx.value) {
            storage.rollback()?;
            return Err(err);
        }

        let mut frame = CallFrame::new(host, sender, self.tx.value);
        let return_code = match method.call(&mut frame, &self.tx.input) {
            Ok(code) => code,
            Err(err) => {
                storage.rollback()?;
                return Err(err);
            }
        };

        if return_code == RETURN_OK {
            storage.commit()?;
        } else {
            warn!(
                "tx {} body returned {}, state rolled back",
                self.tx.hash(),
                return_code
            );
            storage.rollback()?;
        }

        let coinbase = header.coinbase.unwrap_or(self.options.system_address);
        balances.transfer_to(self.options.system_address, coinbase, self.tx.fee)?;

        Ok(Receipt::new(self.tx.hash(), return_code, frame.take_logs()))
    }
}

/// Orchestrates execution of one block's worth of work.
///
/// Composition over inheritance: the miner-wage event is the value chain's
/// pre-block hook on this one executor type, not a subclass override.
pub struct BlockExecutor<'a> {
    header: &'a BlockHeader,
    storage: &'a dyn StateStorage,
    handler: &'a ChainHandler,
    options: &'a GlobalOptions,
    host: HostContext<'a>,
}

impl<'a> BlockExecutor<'a> {
    pub(crate) fn new(
        header: &'a BlockHeader,
        storage: &'a dyn StateStorage,
        handler: &'a ChainHandler,
        options: &'a GlobalOptions,
        host: HostContext<'a>,
    ) -> Self {
        Self {
            header,
            storage,
            handler,
            options,
            host,
        }
    }

    /// The host context wired for this block.
    pub fn host(&self) -> &HostContext<'a> {
        &self.host
    }

    fn coinbase(&self) -> Address {
        self.header.coinbase.unwrap_or(self.options.system_address)
    }

    /// Issues the block's wage to the coinbase.
    ///
    /// Pre-block event: runs before any transaction, so wage and fee income
    /// both land on the same coinbase for the block. The wage amount comes
    /// from the pluggable schedule on the handler registry.
    pub fn execute_miner_wage_event(&self) -> Result<(), ExecutionError> {
        let wage = self.handler.miner_wage(self.header.number);
        let coinbase = self.coinbase();

        let balances = BalanceStore::new(self.storage, self.options.system_address);
        balances.issue(coinbase, wage)?;
        info!(
            "block {}: wage {} issued to {}",
            self.header.number, wage, coinbase
        );
        Ok(())
    }

    /// Runs an arbitrary block-scoped side effect with host-context access.
    pub fn execute_block_event(&self, listener: &BlockListener) -> Result<(), ExecutionError> {
        listener(&self.host)
    }

    /// Executes one transaction against this block's state.
    pub fn execute_transaction(
        &self,
        tx: &Transaction,
        opts: ExecuteOptions,
    ) -> Result<Receipt, ExecutionError> {
        TransactionExecutor::new(tx, self.handler, self.options).execute(
            self.header,
            self.storage,
            &self.host,
            opts,
        )
    }

    /// Runs the pre-block wage event, then every transaction in order.
    ///
    /// Business failures are recorded in their receipts and do not stop the
    /// block; validation and engine faults abort immediately.
    pub fn execute_block(&self, txs: &[Transaction]) -> Result<Vec<Receipt>, ExecutionError> {
        self.execute_miner_wage_event()?;

        let mut receipts = Vec::with_capacity(txs.len());
        for tx in txs {
            receipts.push(self.execute_transaction(tx, ExecuteOptions::default())?);
        }
        Ok(receipts)
    }
}

/// Read-only counterpart of the block executor.
///
/// Same host-context wiring, but no storage scope, no fee, no nonce: a view
/// method answers a query against the current snapshot and must leave no
/// trace.
pub struct ViewExecutor<'a> {
    handler: &'a ChainHandler,
    host: HostContext<'a>,
    method: String,
    params: ParamValue,
}

impl<'a> ViewExecutor<'a> {
    pub(crate) fn new(
        handler: &'a ChainHandler,
        host: HostContext<'a>,
        method: String,
        params: ParamValue,
    ) -> Self {
        Self {
            handler,
            host,
            method,
            params,
        }
    }

    /// Runs the view method and returns its result value.
    pub fn execute(&self) -> Result<ParamValue, ExecutionError> {
        let view = self
            .handler
            .view(&self.method)
            .ok_or_else(|| ExecutionError::UnknownViewMethod(self.method.clone()))?;
        view.view(&self.host, &self.params)
    }
}

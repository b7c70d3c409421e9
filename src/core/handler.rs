//! Method dispatch: the registry mapping method names to handlers.
//!
//! The chain's transaction-processing ruleset supplies handlers at startup;
//! the engine itself ships none. Dispatch is an exact string match into a
//! map of trait objects - no reflection, no fallback.

use crate::consensus::host::HostContext;
use crate::core::error::ExecutionError;
use crate::core::receipt::EventLog;
use crate::core::value::ParamValue;
use crate::types::address::Address;
use crate::types::balance::Balance;
use std::collections::HashMap;

/// Execution frame handed to a method body.
///
/// Carries the host context, the caller's address, the escrowed principal,
/// and collects the event logs the body emits. The frame lives exactly as
/// long as one method invocation.
pub struct CallFrame<'h, 'a> {
    /// Host capabilities for this block.
    pub host: &'h HostContext<'a>,
    /// Sender address of the transaction being executed.
    pub caller: Address,
    /// Principal escrowed on the system address for this call.
    pub value: Balance,
    logs: Vec<EventLog>,
}

impl<'h, 'a> CallFrame<'h, 'a> {
    pub(crate) fn new(host: &'h HostContext<'a>, caller: Address, value: Balance) -> Self {
        Self {
            host,
            caller,
            value,
            logs: Vec::new(),
        }
    }

    /// Appends an event log entry.
    pub fn emit(&mut self, name: impl Into<String>, params: ParamValue) {
        self.logs.push(EventLog {
            name: name.into(),
            params,
        });
    }

    pub(crate) fn take_logs(self) -> Vec<EventLog> {
        self.logs
    }
}

/// A transaction method body.
///
/// `Ok(0)` commits the body's state writes; any other `Ok` code rolls them
/// back and lands in the receipt as a business failure. `Err` is an engine
/// fault and aborts the transaction entirely.
pub trait MethodHandler: Send + Sync {
    fn call(&self, frame: &mut CallFrame<'_, '_>, input: &ParamValue)
        -> Result<u32, ExecutionError>;
}

impl<F> MethodHandler for F
where
    F: Fn(&mut CallFrame<'_, '_>, &ParamValue) -> Result<u32, ExecutionError> + Send + Sync,
{
    fn call(
        &self,
        frame: &mut CallFrame<'_, '_>,
        input: &ParamValue,
    ) -> Result<u32, ExecutionError> {
        self(frame, input)
    }
}

/// A read-only query method.
pub trait ViewHandler: Send + Sync {
    fn view(
        &self,
        host: &HostContext<'_>,
        params: &ParamValue,
    ) -> Result<ParamValue, ExecutionError>;
}

impl<F> ViewHandler for F
where
    F: Fn(&HostContext<'_>, &ParamValue) -> Result<ParamValue, ExecutionError> + Send + Sync,
{
    fn view(
        &self,
        host: &HostContext<'_>,
        params: &ParamValue,
    ) -> Result<ParamValue, ExecutionError> {
        self(host, params)
    }
}

/// A block-scoped side effect run by `execute_block_event`.
pub type BlockListener = dyn Fn(&HostContext<'_>) -> Result<(), ExecutionError> + Send + Sync;

/// Per-block wage amount, by block number.
pub type WageSchedule = dyn Fn(u64) -> Balance + Send + Sync;

/// Registry of method and view handlers plus the wage schedule.
pub struct ChainHandler {
    methods: HashMap<String, Box<dyn MethodHandler>>,
    views: HashMap<String, Box<dyn ViewHandler>>,
    wage: Box<WageSchedule>,
}

impl ChainHandler {
    /// Creates an empty registry with a zero wage schedule.
    pub fn new() -> Self {
        Self {
            methods: HashMap::new(),
            views: HashMap::new(),
            wage: Box::new(|_| Balance::zero()),
        }
    }

    /// Registers a transaction method under `name`, replacing any previous
    /// handler of that name.
    pub fn register_method(&mut self, name: impl Into<String>, handler: impl MethodHandler + 'static) {
        self.methods.insert(name.into(), Box::new(handler));
    }

    /// Registers a view method under `name`.
    pub fn register_view(&mut self, name: impl Into<String>, handler: impl ViewHandler + 'static) {
        self.views.insert(name.into(), Box::new(handler));
    }

    /// Installs the per-block wage schedule.
    pub fn set_miner_wage(&mut self, schedule: impl Fn(u64) -> Balance + Send + Sync + 'static) {
        self.wage = Box::new(schedule);
    }

    /// Looks up a transaction method.
    pub fn method(&self, name: &str) -> Option<&dyn MethodHandler> {
        self.methods.get(name).map(Box::as_ref)
    }

    /// Looks up a view method.
    pub fn view(&self, name: &str) -> Option<&dyn ViewHandler> {
        self.views.get(name).map(Box::as_ref)
    }

    /// Wage due for the block at `number`.
    pub fn miner_wage(&self, number: u64) -> Balance {
        (self.wage)(number)
    }
}

impl Default for ChainHandler {
    fn default() -> Self {
        Self::new()
    }
}

//! Ledger transaction execution engine.
//!
//! Applies signed value-transfer transactions to chain state with atomic
//! method bodies, unconditional fee settlement, and a consensus host context
//! for miner registration and queries. The [`debug`] module provides a
//! deterministic in-memory harness that replays transactions and queries
//! without a network.

pub mod consensus;
pub mod core;
pub mod crypto;
pub mod debug;
pub mod storage;
pub mod types;
pub mod utils;

//! Consensus-facing state: candidate registry and the per-block host context.

pub mod candidates;
pub mod host;

//! Signing keys and signatures.

pub mod key_pair;

//! Structured values passed between the engine and method handlers.
//!
//! Method inputs, view parameters, view results, and event-log payloads are
//! all [`ParamValue`] trees: a small tagged-variant value model with a
//! canonical binary encoding, so every value the engine touches can be
//! hashed and compared deterministically.

use crate::types::address::Address;
use crate::types::balance::Balance;
use std::collections::BTreeMap;
use valuechain_derive::BinaryCodec;

/// A structured, deterministic-encodable value.
#[derive(Clone, Debug, PartialEq, Eq, BinaryCodec)]
pub enum ParamValue {
    /// Absent value.
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Unsigned integer (counts, block numbers, indexes).
    Number(u64),
    /// Currency amount.
    Amount(Balance),
    /// Account address.
    Address(Address),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Blob(Vec<u8>),
    /// Ordered list.
    List(Vec<ParamValue>),
    /// String-keyed map (sorted, so encoding is canonical).
    Map(BTreeMap<String, ParamValue>),
}

impl ParamValue {
    /// Builds a map value from key/value pairs.
    pub fn map<I>(entries: I) -> ParamValue
    where
        I: IntoIterator<Item = (&'static str, ParamValue)>,
    {
        ParamValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    /// Looks up a map entry by key; `None` for non-maps or missing keys.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        match self {
            ParamValue::Map(entries) => entries.get(key),
            _ => None,
        }
    }

    /// Returns the amount for `Amount` values.
    pub fn as_amount(&self) -> Option<Balance> {
        match self {
            ParamValue::Amount(amount) => Some(*amount),
            _ => None,
        }
    }

    /// Returns the address for `Address` values.
    pub fn as_address(&self) -> Option<Address> {
        match self {
            ParamValue::Address(address) => Some(*address),
            _ => None,
        }
    }

    /// Returns the number for `Number` values.
    pub fn as_number(&self) -> Option<u64> {
        match self {
            ParamValue::Number(number) => Some(*number),
            _ => None,
        }
    }

    /// Returns the text for `Text` values.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<Balance> for ParamValue {
    fn from(amount: Balance) -> Self {
        ParamValue::Amount(amount)
    }
}

impl From<Address> for ParamValue {
    fn from(address: Address) -> Self {
        ParamValue::Address(address)
    }
}

impl From<u64> for ParamValue {
    fn from(number: u64) -> Self {
        ParamValue::Number(number)
    }
}

impl From<&str> for ParamValue {
    fn from(text: &str) -> Self {
        ParamValue::Text(text.to_string())
    }
}

impl From<bool> for ParamValue {
    fn from(flag: bool) -> Self {
        ParamValue::Bool(flag)
    }
}

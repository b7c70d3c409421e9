//! 20-byte account addresses with a checksummed text encoding.
//!
//! Addresses are derived from public keys via SHA3-256, taking the last 20
//! bytes. The canonical text form is `0x` plus 40 hex digits whose letter
//! case encodes a SHA3-based checksum, so a single mistyped character is
//! detected when parsing.

use crate::types::hash::Hash;
use std::fmt;
use std::str::FromStr;
use valuechain_derive::{BinaryCodec, Error};

/// Address length in bytes.
pub const ADDRESS_SIZE: usize = 20;

/// Fixed-size 20-byte address identifying an account.
///
/// Equality is byte-exact. `Copy` because addresses are passed on every
/// balance lookup and transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Ord, PartialOrd, BinaryCodec)]
pub struct Address(pub [u8; ADDRESS_SIZE]);

/// Errors produced when parsing an address from its text form.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum AddressParseError {
    /// Input is not `0x` + 40 hex digits.
    #[error("address must be 0x followed by 40 hex digits")]
    InvalidLength,
    /// Input contains a non-hexadecimal character.
    #[error("address contains a non-hex character")]
    InvalidHex,
    /// Letter casing does not match the checksum.
    #[error("address checksum mismatch")]
    ChecksumMismatch,
}

impl Address {
    /// Creates a zero-valued address.
    ///
    /// Not a spendable account; used as an explicit "nobody" placeholder in
    /// tests.
    pub const fn zero() -> Address {
        Address([0u8; ADDRESS_SIZE])
    }

    /// Returns the address as a byte slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Renders the checksummed text form.
    ///
    /// Hex digits a-f are uppercased wherever the corresponding nibble of
    /// SHA3-256(lowercase hex) is >= 8, mirroring the mixed-case checksum
    /// scheme used by account-model chains.
    pub fn to_checksum_string(&self) -> String {
        let lower = hex_lower(&self.0);
        let check = Hash::digest(lower.as_bytes());

        let mut out = String::with_capacity(2 + ADDRESS_SIZE * 2);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = (check.0[i / 2] >> (4 * (1 - i % 2))) & 0x0F;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum_string())
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    /// Parses the canonical text form, verifying the checksum.
    ///
    /// All-lowercase and all-uppercase inputs are accepted without a
    /// checksum, matching common parser behavior for hand-typed addresses.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .ok_or(AddressParseError::InvalidLength)?;
        if digits.len() != ADDRESS_SIZE * 2 {
            return Err(AddressParseError::InvalidLength);
        }

        let mut bytes = [0u8; ADDRESS_SIZE];
        for (i, chunk) in digits.as_bytes().chunks(2).enumerate() {
            let high = hex_value(chunk[0]).ok_or(AddressParseError::InvalidHex)?;
            let low = hex_value(chunk[1]).ok_or(AddressParseError::InvalidHex)?;
            bytes[i] = (high << 4) | low;
        }

        let address = Address(bytes);
        let has_lower = digits.bytes().any(|b| b.is_ascii_lowercase());
        let has_upper = digits.bytes().any(|b| b.is_ascii_uppercase());
        if has_lower && has_upper && address.to_checksum_string() != s {
            return Err(AddressParseError::ChecksumMismatch);
        }
        Ok(address)
    }
}

fn hex_lower(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

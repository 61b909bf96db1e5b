//! Serde adapters for the hex quantity encodings used on the JSON-RPC wire.
//!
//! Quantities arrive as 0x-prefixed hex strings (`"0x1b4"`), never as JSON
//! numbers. Each adapter tolerates an absent or `null` value by producing the
//! zero value, since partially populated results are routine (pre-Byzantium
//! receipts without `status`, headers fetched without transactions).

use alloy_primitives::U256;
use serde::{Deserialize, Deserializer};

/// Encodes a `u64` as a 0x-prefixed hex string for request parameters.
#[must_use]
pub fn encode_u64(value: u64) -> String {
    format!("0x{value:x}")
}

/// Parses a hex string to `u64`, with or without the 0x prefix.
#[must_use]
pub fn parse_hex_u64(hex: &str) -> Option<u64> {
    let hex_str = hex.strip_prefix("0x").unwrap_or(hex);
    u64::from_str_radix(hex_str, 16).ok()
}

/// Parses a hex string to a fixed-size byte array.
///
/// Returns `None` unless the digits decode to exactly `N` bytes.
#[must_use]
pub fn parse_hex_array<const N: usize>(hex: &str) -> Option<[u8; N]> {
    let hex_str = hex.strip_prefix("0x").unwrap_or(hex);
    if hex_str.len() != N * 2 {
        return None;
    }
    let mut array = [0u8; N];
    hex::decode_to_slice(hex_str, &mut array).ok()?;
    Some(array)
}

fn parse_u256(s: &str) -> Option<U256> {
    let hex_str = s.strip_prefix("0x").unwrap_or(s);
    if hex_str.is_empty() {
        return Some(U256::ZERO);
    }
    U256::from_str_radix(hex_str, 16).ok()
}

/// `u64` from a 0x-hex string; absent or `null` decodes as zero.
pub mod hex_u64 {
    use super::{parse_hex_u64, Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(0),
            Some(s) => parse_hex_u64(&s)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid hex quantity: {s}"))),
        }
    }
}

/// `Option<u64>` from a 0x-hex string; absent or `null` decodes as `None`.
pub mod hex_u64_opt {
    use super::{parse_hex_u64, Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(s) => parse_hex_u64(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid hex quantity: {s}"))),
        }
    }
}

/// A single byte from a 0x-hex string (`"0x2"` for a type-2 transaction).
pub mod hex_byte {
    use super::{parse_hex_u64, Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u8, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(0),
            Some(s) => parse_hex_u64(&s)
                .and_then(|v| u8::try_from(v).ok())
                .ok_or_else(|| serde::de::Error::custom(format!("invalid hex byte: {s}"))),
        }
    }
}

/// 256-bit quantity from a 0x-hex string; absent or `null` decodes as zero.
pub mod hex_u256 {
    use super::{parse_u256, Deserialize, Deserializer, U256};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(U256::ZERO),
            Some(s) => parse_u256(&s)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid hex quantity: {s}"))),
        }
    }
}

/// `Option<U256>` from a 0x-hex string; absent or `null` decodes as `None`.
pub mod hex_u256_opt {
    use super::{parse_u256, Deserialize, Deserializer, U256};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<U256>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(s) => parse_u256(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid hex quantity: {s}"))),
        }
    }
}

//! Wire-level JSON-RPC types shared across the crate.
//!
//! Requests carry free-form diagnostic string ids; responses are matched to
//! requests positionally, never by id echo. In-band errors arrive as a
//! `{code, message}` object where a non-zero code signals presence.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// JSON-RPC protocol version sent with every request.
pub const JSONRPC_VERSION: &str = "2.0";

/// A single JSON-RPC request object.
///
/// The `id` is a diagnostic string (tag plus random suffix) and is not used
/// for response correlation; batch responses are consumed by position.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    pub id: String,
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: serde_json::Value,
}

impl Request {
    /// Creates a request with a tagged diagnostic id.
    #[must_use]
    pub fn new(tag: &str, method: &'static str, params: serde_json::Value) -> Self {
        Self { id: rpc_id(tag), jsonrpc: JSONRPC_VERSION, method, params }
    }
}

/// Builds a diagnostic request id: the tag followed by ten random bytes.
#[must_use]
pub fn rpc_id(tag: &str) -> String {
    let suffix: [u8; 10] = rand::random();
    format!("{tag}-{}", hex::encode(suffix))
}

/// In-band JSON-RPC error object.
///
/// A zero code means no error was present in the response.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RpcError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

impl RpcError {
    /// Returns `true` if the response carried an error.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.code != 0
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code={} msg={}", self.code, self.message)
    }
}

/// Response envelope for a single JSON-RPC result.
///
/// `result` is `None` when the backend returns `null` (e.g. an unknown
/// block); `error` defaults to the zero value when absent.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub error: RpcError,
    #[serde(default = "Option::default")]
    pub result: Option<T>,
}

/// A 32-byte hash (block hash, transaction hash, log topic).
///
/// Deserializes from a 0x-prefixed hex string; a JSON `null` yields the zero
/// hash so partially populated responses decode cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hash32(pub [u8; 32]);

impl Hash32 {
    /// Returns the inner byte array.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns `true` if every byte is zero (the unset value).
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Short hex prefix used in diagnostics, mirroring `%.4x` formatting.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

/// Error type for 32-byte hash parsing.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HashParseError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("invalid length: expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

impl TryFrom<&str> for Hash32 {
    type Error = HashParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let hex_str = value.strip_prefix("0x").unwrap_or(value);
        let bytes = hex::decode(hex_str).map_err(|e| HashParseError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(HashParseError::InvalidLength(bytes.len()));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Hash32(arr))
    }
}

impl From<[u8; 32]> for Hash32 {
    fn from(arr: [u8; 32]) -> Self {
        Hash32(arr)
    }
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Hash32 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(Hash32::default()),
            Some(s) => Hash32::try_from(s.as_str()).map_err(serde::de::Error::custom),
        }
    }
}

/// A variable-length byte string (addresses, calldata, contract addresses).
///
/// Deserializes from a 0x-prefixed hex string; `null` yields the empty value,
/// which is how absent fields like a creation transaction's `to` decode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    /// Returns the raw bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Returns `true` when no bytes are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(v: Vec<u8>) -> Self {
        Bytes(v)
    }
}

impl From<&[u8]> for Bytes {
    fn from(v: &[u8]) -> Self {
        Bytes(v.to_vec())
    }
}

impl fmt::Display for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Bytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(Bytes::default()),
            Some(s) => {
                let hex_str = s.strip_prefix("0x").unwrap_or(&s);
                hex::decode(hex_str).map(Bytes).map_err(serde::de::Error::custom)
            }
        }
    }
}

//! Crate error type.
//!
//! Everything surfaces to the caller; only the tip-cache refreshers absorb
//! their own failures (recorded in the cache, reported at the next `latest`).

use crate::types::RpcError;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced while fetching and assembling chain data.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Request serialization failed before any bytes were sent.
    #[error("unable to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    /// Network-level failure from the underlying HTTP client.
    #[error("unable to do http request: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx HTTP response; the body is sanitized and truncated.
    #[error("rpc http error: {status} {body}")]
    Http { status: u16, body: String },

    /// 2xx response whose body did not decode into the expected shape.
    #[error("unable to json decode: {0}")]
    Decode(#[source] serde_json::Error),

    /// WebSocket dial, write, or read failure.
    #[error("websocket: {0}")]
    Ws(String),

    /// The caller's context was canceled while the call was in flight.
    #[error("request canceled")]
    Canceled,

    /// In-band JSON-RPC error returned by the upstream.
    #[error("rpc={method} {error}")]
    Rpc { method: &'static str, error: RpcError },

    /// Parent-hash continuity check failed within a fetched segment.
    #[error("{what}: corrupt chain segment")]
    CorruptSegment { what: &'static str },

    /// First or last block number disagrees with the requested range.
    #[error("{what}: rpc response contains invalid data. requested {requested} got: {got}")]
    RangeMismatch { what: &'static str, requested: u64, got: u64 },

    /// Enrichment result references a block outside the requested window.
    #[error("{method} out of range block. num={num} start={start} lim={limit}")]
    OutOfRange { method: &'static str, num: u64, start: u64, limit: u64 },

    /// Enrichment references a block absent from the block map.
    #[error("block {num} missing from block map")]
    MissingBlock { num: u64 },

    /// RPC returned success but zero results where at least one was required.
    #[error("{method}: no rpc error but empty result")]
    EmptyResult { method: &'static str },

    /// An endpoint string did not parse as a URL.
    #[error("unable to parse url: {0}")]
    InvalidUrl(String),

    /// Client constructed with no endpoints.
    #[error("no endpoints configured")]
    NoEndpoints,
}

impl Error {
    /// Shorthand for an in-band RPC error tied to the method that raised it.
    #[must_use]
    pub fn rpc(method: &'static str, error: RpcError) -> Self {
        Error::Rpc { method, error }
    }

    /// Returns `true` for connection-reset shaped failures (resets, timeouts,
    /// cancellation), which the tip cache downgrades to a terse debug line.
    #[must_use]
    pub fn is_connection_reset(&self) -> bool {
        match self {
            Error::Canceled => true,
            Error::Network(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

//! HTTP transport for single and batch JSON-RPC calls.
//!
//! One reqwest client serves all endpoints: rustls TLS, gzip response
//! decompression, and a 10 second per-call budget applied at the client
//! level. Requests are serialized up front into a [`bytes::Bytes`] body;
//! an encode failure aborts the call before any bytes reach the wire.

use serde::{de::DeserializeOwned, Serialize};
use std::{io::Write, time::Duration};

use crate::{
    ctx::Ctx,
    endpoint::Endpoint,
    error::{Error, Result},
};

/// Per-call budget covering connect, send, and body read.
const CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum characters of a non-2xx body surfaced in the error.
const BODY_EXCERPT: usize = 100;

/// Shared HTTP transport. Cheap to clone; all clones share one connection
/// pool.
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
}

impl Transport {
    /// Builds the transport with the crate's fixed client configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to build.
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(CALL_TIMEOUT)
            .gzip(true)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()?;
        Ok(Self { http })
    }

    /// Issues one JSON-RPC call and decodes the response into `R`.
    ///
    /// `payload` may be a single request object or an ordered batch (a
    /// slice or tuple); the response is decoded positionally into whatever
    /// shape `R` declares. Successful calls increment the context's request
    /// counter.
    ///
    /// # Errors
    ///
    /// - [`Error::Encode`] if the payload fails to serialize
    /// - [`Error::Canceled`] if the context is canceled mid-flight
    /// - [`Error::Network`] for connection-level failures
    /// - [`Error::Http`] for non-2xx responses, with a sanitized excerpt
    /// - [`Error::Decode`] if the 2xx body does not match `R`
    pub async fn execute<P, R>(&self, ctx: &Ctx, endpoint: &Endpoint, payload: &P) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = serde_json::to_vec(payload).map_err(Error::Encode)?;
        if endpoint.debug() {
            dump(&body);
        }

        let send = self.send(endpoint, body);
        let raw = tokio::select! {
            () = ctx.cancelled() => return Err(Error::Canceled),
            raw = send => raw?,
        };

        if endpoint.debug() {
            dump(&raw);
        }
        let decoded = serde_json::from_slice(&raw).map_err(Error::Decode)?;
        ctx.count_request();
        Ok(decoded)
    }

    async fn send(&self, endpoint: &Endpoint, body: Vec<u8>) -> Result<bytes::Bytes> {
        let resp = self
            .http
            .post(endpoint.url().clone())
            .header("content-type", "application/json")
            .body(bytes::Bytes::from(body))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let raw = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body: sanitize_body(&raw),
            });
        }
        Ok(resp.bytes().await?)
    }
}

/// Strips non-printable characters and truncates to the excerpt budget.
fn sanitize_body(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_control())
        .take(BODY_EXCERPT)
        .collect()
}

/// Writes raw request or response bytes to stdout for debug endpoints.
fn dump(bytes: &[u8]) {
    let mut out = std::io::stdout().lock();
    let _ = out.write_all(bytes);
    let _ = out.write_all(b"\n");
}

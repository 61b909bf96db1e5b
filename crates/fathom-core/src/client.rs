//! The client: endpoint rotation, tip reads, and range assembly.
//!
//! `get` selects a primary fetcher from the filter (blocks → headers →
//! synthetic), routes it through the matching range cache, then applies at
//! most one enrichment (receipts → logs → traces) to the assembled slice.
//! `latest` reads the tip cache, launching the background refresher on
//! first use and falling back to a direct fetch on a miss.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use crate::{
    block::{Block, BlockMap},
    cache::{RangeCache, TipCache, DEFAULT_MAX_READS},
    codec,
    ctx::Ctx,
    endpoint::Endpoint,
    error::{Error, Result},
    fetch,
    filter::Filter,
    transport::Transport,
    types::{Envelope, Hash32, Request},
    ws,
};

/// Default interval between HTTP tip polls.
const DEFAULT_POLL_DURATION: Duration = Duration::from_secs(1);

/// Process-scoped fetch client over one or more JSON-RPC endpoints.
///
/// Safe to share across tasks; all state is internally synchronized. The
/// tip refresher is launched lazily on the first `latest` call.
#[derive(Debug)]
pub struct Client {
    endpoints: Vec<Endpoint>,
    ws_url: Option<String>,
    transport: Transport,
    rotor: AtomicU64,
    poll_duration: Duration,
    tip: Arc<TipCache>,
    bcache: RangeCache,
    hcache: RangeCache,
}

impl Client {
    /// Creates a client from endpoint strings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoEndpoints`] for an empty list and
    /// [`Error::InvalidUrl`] for a string that does not parse.
    pub fn new<S: AsRef<str>>(endpoints: &[S]) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(Error::NoEndpoints);
        }
        let endpoints = endpoints
            .iter()
            .map(|s| Endpoint::parse(s.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            endpoints,
            ws_url: None,
            transport: Transport::new()?,
            rotor: AtomicU64::new(0),
            poll_duration: DEFAULT_POLL_DURATION,
            tip: Arc::new(TipCache::new(DEFAULT_MAX_READS)),
            bcache: RangeCache::new(DEFAULT_MAX_READS),
            hcache: RangeCache::new(DEFAULT_MAX_READS),
        })
    }

    /// Replaces the bounded-reuse budget on the tip and range caches.
    #[must_use]
    pub fn with_max_reads(mut self, n: u32) -> Self {
        self.tip.set_max_reads(n);
        self.bcache.set_max_reads(n);
        self.hcache.set_max_reads(n);
        self
    }

    /// Replaces the HTTP tip-poll interval.
    #[must_use]
    pub fn with_poll_duration(mut self, d: Duration) -> Self {
        self.poll_duration = d;
        self
    }

    /// Configures a WebSocket endpoint for push tip updates. When set, the
    /// refresher subscribes to `newHeads` instead of polling.
    #[must_use]
    pub fn with_ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = Some(url.into());
        self
    }

    /// Selects the next endpoint by atomic round-robin rotation.
    #[must_use]
    pub fn next_endpoint(&self) -> &Endpoint {
        let n = self.rotor.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        let idx = (n % self.endpoints.len() as u64) as usize;
        &self.endpoints[idx]
    }

    /// Returns the latest block number and hash at least as new as `n`.
    ///
    /// If the cached tip covers `n` (and its reuse budget holds), the cached
    /// pair is returned without an upstream call; otherwise the latest
    /// header is fetched directly and the cache updated. `n == 0` always
    /// bypasses the cache. The first call launches the background refresher;
    /// a refresher that has since died is relaunched here.
    ///
    /// # Errors
    ///
    /// Surfaces transport and in-band RPC errors from the direct fetch.
    pub async fn latest(&self, ctx: &Ctx, endpoint: &Endpoint, n: u64) -> Result<(u64, Hash32)> {
        if self.tip.try_start() {
            match &self.ws_url {
                Some(ws_url) => {
                    tracing::debug!(ws_url = %ws_url, "fathom ws listening");
                    tokio::spawn(ws::listen(self.tip.clone(), ws_url.clone()));
                }
                None => {
                    tracing::debug!("fathom http polling");
                    tokio::spawn(Self::poll(
                        self.transport.clone(),
                        endpoint.clone(),
                        self.tip.clone(),
                        self.poll_duration,
                    ));
                }
            }
        }

        if let Some((num, hash)) = self.tip.get(n) {
            return Ok((num, hash));
        }

        let (num, hash) = Self::fetch_latest(&self.transport, ctx, endpoint).await?;
        tracing::debug!(n = num, h = %hash.short(), "http-get-latest");
        self.tip.update(num, hash);
        Ok((num, hash))
    }

    /// Fetches the hash of block `n` directly, bypassing all caches.
    ///
    /// # Errors
    ///
    /// Surfaces transport and in-band RPC errors; an unknown block is
    /// [`Error::EmptyResult`].
    pub async fn hash(&self, ctx: &Ctx, endpoint: &Endpoint, n: u64) -> Result<Hash32> {
        let req = Request::new(
            &format!("hash-{n}"),
            "eth_getBlockByNumber",
            serde_json::json!([codec::encode_u64(n), true]),
        );
        let resp: Envelope<crate::block::Header> =
            self.transport.execute(ctx, endpoint, &req).await?;
        if resp.error.exists() {
            return Err(Error::rpc("eth_getBlockByNumber/hash", resp.error));
        }
        let header = resp.result.ok_or(Error::EmptyResult { method: "eth_getBlockByNumber" })?;
        Ok(header.hash)
    }

    /// Fetches and assembles blocks for `[start, start+limit)` per `filter`.
    ///
    /// The primary aspect (blocks, headers, or synthetic number-only
    /// blocks) is routed through the range cache keyed on `(start, limit)`,
    /// honoring the endpoint's `nocache` flag. At most one enrichment then
    /// mutates the returned slice in place; each caller owns its slice, so
    /// enrichment never touches cached state.
    ///
    /// # Errors
    ///
    /// Surfaces fetcher validation failures (`CorruptSegment`,
    /// `RangeMismatch`, `OutOfRange`, `MissingBlock`, `EmptyResult`) along
    /// with transport and RPC errors.
    pub async fn get(
        &self,
        ctx: &Ctx,
        endpoint: &Endpoint,
        filter: &Filter,
        start: u64,
        limit: u64,
    ) -> Result<Vec<Block>> {
        let t0 = Instant::now();
        let mut blocks = if filter.use_blocks {
            self.bcache
                .get(endpoint.nocache(), start, limit, || {
                    fetch::blocks(&self.transport, ctx, endpoint, start, limit)
                })
                .await?
        } else if filter.use_headers {
            self.hcache
                .get(endpoint.nocache(), start, limit, || {
                    fetch::headers(&self.transport, ctx, endpoint, start, limit)
                })
                .await?
        } else {
            (0..limit).map(|i| Block::with_number(start + i)).collect()
        };

        {
            let mut bm: BlockMap<'_> = blocks.iter_mut().map(|b| (b.num(), b)).collect();
            if filter.use_receipts {
                fetch::receipts(&self.transport, ctx, endpoint, &mut bm, start, limit).await?;
            } else if filter.use_logs {
                fetch::logs(&self.transport, ctx, endpoint, filter, &mut bm, start, limit).await?;
            } else if filter.use_traces {
                fetch::traces(&self.transport, ctx, endpoint, &mut bm, start, limit).await?;
            }
        }

        tracing::debug!(
            filter = ?filter,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "fathom-get"
        );
        Ok(blocks)
    }

    async fn fetch_latest(
        transport: &Transport,
        ctx: &Ctx,
        endpoint: &Endpoint,
    ) -> Result<(u64, Hash32)> {
        let req = Request::new(
            "latest",
            "eth_getBlockByNumber",
            serde_json::json!(["latest", false]),
        );
        let resp: Envelope<crate::block::Header> = transport.execute(ctx, endpoint, &req).await?;
        if resp.error.exists() {
            return Err(Error::rpc("eth_getBlockByNumber/latest", resp.error));
        }
        let header = resp.result.ok_or(Error::EmptyResult { method: "eth_getBlockByNumber" })?;
        Ok((header.number, header.hash))
    }

    /// HTTP tip poller: one `eth_getBlockByNumber("latest")` per interval.
    /// The first failure is parked in the cache and the task exits.
    async fn poll(transport: Transport, endpoint: Endpoint, tip: Arc<TipCache>, every: Duration) {
        let ctx = Ctx::background();
        loop {
            tokio::time::sleep(every).await;
            match Self::fetch_latest(&transport, &ctx, &endpoint).await {
                Ok((num, hash)) => {
                    tracing::debug!(n = num, h = %hash.short(), "http poll");
                    tip.update(num, hash);
                }
                Err(err) => {
                    tip.error(err);
                    return;
                }
            }
        }
    }
}

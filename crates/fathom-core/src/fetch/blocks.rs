//! Base fetchers: full blocks and headers over a block-number batch.

use std::time::Instant;

use crate::{
    block::{Block, Header},
    codec,
    ctx::Ctx,
    endpoint::Endpoint,
    error::{Error, Result},
    fetch::validate,
    transport::Transport,
    types::{Envelope, Request},
};

/// Fetches `limit` full blocks starting at `start` in one positional batch
/// of `eth_getBlockByNumber(hex(n), true)` calls.
pub(crate) async fn blocks(
    transport: &Transport,
    ctx: &Ctx,
    endpoint: &Endpoint,
    start: u64,
    limit: u64,
) -> Result<Vec<Block>> {
    let t0 = Instant::now();
    let tag = format!("blocks-{start}-{limit}");
    let reqs: Vec<Request> = (0..limit)
        .map(|i| {
            Request::new(
                &tag,
                "eth_getBlockByNumber",
                serde_json::json!([codec::encode_u64(start + i), true]),
            )
        })
        .collect();

    let resps: Vec<Envelope<Block>> = transport.execute(ctx, endpoint, &reqs).await?;
    for resp in &resps {
        if resp.error.exists() {
            return Err(Error::rpc("eth_getBlockByNumber", resp.error.clone()));
        }
    }
    let blocks: Vec<Block> = resps.into_iter().map(|r| r.result.unwrap_or_default()).collect();
    tracing::debug!(elapsed_ms = t0.elapsed().as_millis() as u64, "http-get-blocks");
    validate("blocks", start, limit, &blocks)?;
    Ok(blocks)
}

/// Fetches `limit` headers starting at `start`; the returned blocks carry
/// only header fields.
pub(crate) async fn headers(
    transport: &Transport,
    ctx: &Ctx,
    endpoint: &Endpoint,
    start: u64,
    limit: u64,
) -> Result<Vec<Block>> {
    let t0 = Instant::now();
    let tag = format!("headers-{start}-{limit}");
    let reqs: Vec<Request> = (0..limit)
        .map(|i| {
            Request::new(
                &tag,
                "eth_getBlockByNumber",
                serde_json::json!([codec::encode_u64(start + i), false]),
            )
        })
        .collect();

    let resps: Vec<Envelope<Header>> = transport.execute(ctx, endpoint, &reqs).await?;
    for resp in &resps {
        if resp.error.exists() {
            return Err(Error::rpc("eth_getBlockByNumber/headers", resp.error.clone()));
        }
    }
    let blocks: Vec<Block> = resps
        .into_iter()
        .map(|r| Block { header: r.result.unwrap_or_default(), txs: Vec::new() })
        .collect();
    tracing::debug!(elapsed_ms = t0.elapsed().as_millis() as u64, "http-get-headers");
    validate("headers", start, limit, &blocks)?;
    Ok(blocks)
}

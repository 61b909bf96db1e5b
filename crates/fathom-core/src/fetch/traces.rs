//! Traces enrichment via iterated `trace_block` calls.
//!
//! Unlike the other fetchers this one issues one call per block rather than
//! a batch: trace responses are large and some backends reject batched
//! trace requests outright.

use serde::Deserialize;
use std::{collections::HashMap, time::Instant};

use crate::{
    block::{BlockMap, TraceAction},
    codec,
    ctx::Ctx,
    endpoint::Endpoint,
    error::{Error, Result},
    fetch::TxKey,
    transport::Transport,
    types::{Envelope, Hash32, Request},
};

#[derive(Debug, Deserialize)]
struct TraceResult {
    #[serde(default, rename = "blockHash")]
    block_hash: Hash32,
    // trace_block reports these as JSON numbers, not hex quantities.
    #[serde(default, rename = "blockNumber")]
    block_num: u64,
    #[serde(default, rename = "transactionHash")]
    tx_hash: Hash32,
    #[serde(default, rename = "transactionPosition")]
    tx_idx: u64,
    #[serde(default)]
    action: TraceAction,
}

/// Fetches execution traces for each block in `[start, start+limit)` and
/// attaches the actions to their transactions, assigning per-transaction
/// sequential indexes. Every block is required to produce at least one
/// trace (the coinbase reward trace if nothing else).
pub(crate) async fn traces(
    transport: &Transport,
    ctx: &Ctx,
    endpoint: &Endpoint,
    bm: &mut BlockMap<'_>,
    start: u64,
    limit: u64,
) -> Result<()> {
    let t0 = Instant::now();
    let tag = format!("traces-{start}-{limit}");
    for i in 0..limit {
        let req =
            Request::new(&tag, "trace_block", serde_json::json!([codec::encode_u64(start + i)]));
        let resp: Envelope<Vec<TraceResult>> = transport.execute(ctx, endpoint, &req).await?;
        if resp.error.exists() {
            return Err(Error::rpc("trace_block", resp.error));
        }
        let results = resp.result.unwrap_or_default();
        let Some(first) = results.first() else {
            return Err(Error::EmptyResult { method: "trace_block" });
        };
        let block_num = first.block_num;
        let block = bm.get_mut(&block_num).ok_or(Error::MissingBlock { num: block_num })?;
        block.header.hash = first.block_hash;

        let mut by_tx: HashMap<TxKey, Vec<TraceResult>> = HashMap::new();
        for result in results {
            by_tx.entry(TxKey { block: block_num, tx: result.tx_idx }).or_default().push(result);
        }
        for (key, group) in by_tx {
            let tx = block.tx_mut(key.tx);
            tx.hash = group[0].tx_hash;
            tx.trace_actions = group
                .into_iter()
                .enumerate()
                .map(|(idx, result)| TraceAction { idx: idx as u64, ..result.action })
                .collect();
        }
    }
    tracing::debug!(elapsed_ms = t0.elapsed().as_millis() as u64, "http-get-traces");
    Ok(())
}

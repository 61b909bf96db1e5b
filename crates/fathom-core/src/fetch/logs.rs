//! Logs enrichment via a confirm-then-filter batch.
//!
//! A single batch carries two calls: a header fetch for the final block of
//! the window, confirming the backend has caught up that far, and the
//! `eth_getLogs` query itself. The two differently shaped responses decode
//! into a tagged pair.

use serde::{Deserialize, Serialize};
use std::{collections::HashMap, time::Instant};

use crate::{
    block::{BlockMap, Header, Log},
    codec,
    ctx::Ctx,
    endpoint::Endpoint,
    error::{Error, Result},
    fetch::TxKey,
    filter::Filter,
    transport::Transport,
    types::{Envelope, Hash32, Request},
};

#[derive(Debug, Serialize)]
struct LogQuery<'a> {
    #[serde(rename = "fromBlock")]
    from_block: String,
    #[serde(rename = "toBlock")]
    to_block: String,
    address: &'a [String],
    topics: &'a [Vec<String>],
}

#[derive(Debug, Deserialize)]
struct LogResult {
    #[serde(flatten)]
    log: Log,
    #[serde(default, rename = "blockHash")]
    block_hash: Hash32,
    #[serde(default, rename = "blockNumber", with = "codec::hex_u64")]
    block_num: u64,
    #[serde(default, rename = "transactionHash")]
    tx_hash: Hash32,
    #[serde(default, rename = "transactionIndex", with = "codec::hex_u64")]
    tx_idx: u64,
}

/// Fetches logs matching `filter` over `[start, start+limit)` and appends
/// them to their transactions, preserving upstream order within each
/// transaction. The bounds check here is exclusive at the upper end, unlike
/// receipts.
pub(crate) async fn logs(
    transport: &Transport,
    ctx: &Ctx,
    endpoint: &Endpoint,
    filter: &Filter,
    bm: &mut BlockMap<'_>,
    start: u64,
    limit: u64,
) -> Result<()> {
    let t0 = Instant::now();
    let to_block = start + limit - 1;
    let query = LogQuery {
        from_block: codec::encode_u64(start),
        to_block: codec::encode_u64(to_block),
        address: filter.addresses(),
        topics: filter.topics(),
    };
    let reqs = [
        Request::new(
            &format!("blocks-{start}-{limit}"),
            "eth_getBlockByNumber",
            serde_json::json!([query.to_block.as_str(), false]),
        ),
        Request::new(
            &format!("logs-{start}-{limit}"),
            "eth_getLogs",
            serde_json::json!([query]),
        ),
    ];

    let (hresp, lresp): (Envelope<Header>, Envelope<Vec<LogResult>>) =
        transport.execute(ctx, endpoint, &reqs).await?;
    if hresp.error.exists() {
        return Err(Error::rpc("eth_getLogs/eth_getBlockByNumber", hresp.error));
    }
    if lresp.error.exists() {
        return Err(Error::rpc("eth_getLogs", lresp.error));
    }
    if hresp.result.is_none() {
        tracing::debug!(to_block = to_block, "eth backend missing final block of log window");
        return Err(Error::EmptyResult { method: "eth_getBlockByNumber" });
    }

    let results = lresp.result.unwrap_or_default();
    let nlogs = results.len();
    let mut by_tx: HashMap<TxKey, Vec<LogResult>> = HashMap::new();
    for result in results {
        if result.block_num < start || result.block_num >= start + limit {
            return Err(Error::OutOfRange {
                method: "eth_getLogs",
                num: result.block_num,
                start,
                limit,
            });
        }
        by_tx
            .entry(TxKey { block: result.block_num, tx: result.tx_idx })
            .or_default()
            .push(result);
    }

    for (key, group) in by_tx {
        let block = bm.get_mut(&key.block).ok_or(Error::MissingBlock { num: key.block })?;
        block.header.hash = group[0].block_hash;
        let tx = block.tx_mut(key.tx);
        tx.hash = group[0].tx_hash;
        for result in group {
            tx.logs.push(result.log);
        }
    }

    tracing::debug!(
        nlogs = nlogs,
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "http-get-logs"
    );
    Ok(())
}

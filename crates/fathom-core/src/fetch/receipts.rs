//! Receipts enrichment via batched `eth_getBlockReceipts` calls.

use alloy_primitives::U256;
use serde::Deserialize;

use crate::{
    block::{BlockMap, Log},
    codec,
    ctx::Ctx,
    endpoint::Endpoint,
    error::{Error, Result},
    transport::Transport,
    types::{Bytes, Envelope, Hash32, Request},
};

#[derive(Debug, Deserialize)]
struct ReceiptResult {
    #[serde(default, rename = "blockHash")]
    block_hash: Hash32,
    #[serde(default, rename = "blockNumber", with = "codec::hex_u64")]
    block_num: u64,
    #[serde(default, rename = "transactionHash")]
    tx_hash: Hash32,
    #[serde(default, rename = "transactionIndex", with = "codec::hex_u64")]
    tx_idx: u64,
    #[serde(default, rename = "type", with = "codec::hex_byte")]
    tx_type: u8,
    #[serde(default)]
    from: Bytes,
    #[serde(default)]
    to: Bytes,
    #[serde(default, with = "codec::hex_byte")]
    status: u8,
    #[serde(default, rename = "gasUsed", with = "codec::hex_u64")]
    gas_used: u64,
    #[serde(default, rename = "effectiveGasPrice", with = "codec::hex_u256")]
    effective_gas_price: U256,
    #[serde(default)]
    logs: Vec<Log>,
    #[serde(default, rename = "contractAddress")]
    contract_address: Bytes,
    #[serde(default, rename = "l1BaseFeeScalar", with = "codec::hex_u256_opt")]
    l1_base_fee_scalar: Option<U256>,
    #[serde(default, rename = "l1BlobBaseFee", with = "codec::hex_u256_opt")]
    l1_blob_base_fee: Option<U256>,
    #[serde(default, rename = "l1BlobBaseFeeScalar", with = "codec::hex_u256_opt")]
    l1_blob_base_fee_scalar: Option<U256>,
    #[serde(default, rename = "l1Fee", with = "codec::hex_u256_opt")]
    l1_fee: Option<U256>,
    #[serde(default, rename = "l1GasPrice", with = "codec::hex_u256_opt")]
    l1_gas_price: Option<U256>,
    #[serde(default, rename = "l1GasUsed", with = "codec::hex_u64_opt")]
    l1_gas_used: Option<u64>,
}

/// Fetches receipts for `[start, start+limit)` and stitches them into the
/// block map by `(block number, tx index)`.
///
/// The reported block hash is written into the header, ratifying the hash
/// when the base fetch was headers-only or synthetic. An empty per-block
/// receipt array is logged and skipped rather than failing the batch. The
/// bounds check here is inclusive at the upper end, unlike logs.
pub(crate) async fn receipts(
    transport: &Transport,
    ctx: &Ctx,
    endpoint: &Endpoint,
    bm: &mut BlockMap<'_>,
    start: u64,
    limit: u64,
) -> Result<()> {
    let tag = format!("receipts-{start}-{limit}");
    let reqs: Vec<Request> = (0..limit)
        .map(|i| {
            Request::new(
                &tag,
                "eth_getBlockReceipts",
                serde_json::json!([codec::encode_u64(start + i)]),
            )
        })
        .collect();

    let resps: Vec<Envelope<Vec<ReceiptResult>>> = transport.execute(ctx, endpoint, &reqs).await?;
    for resp in &resps {
        if resp.error.exists() {
            return Err(Error::rpc("eth_getBlockReceipts", resp.error.clone()));
        }
    }

    for resp in resps {
        let results = resp.result.unwrap_or_default();
        let Some(first) = results.first() else {
            tracing::error!("no rpc error but empty result");
            continue;
        };
        let block_num = first.block_num;
        if block_num < start || block_num > start + limit {
            return Err(Error::OutOfRange {
                method: "eth_getBlockReceipts",
                num: block_num,
                start,
                limit,
            });
        }
        let block = bm.get_mut(&block_num).ok_or(Error::MissingBlock { num: block_num })?;
        block.header.hash = first.block_hash;
        for receipt in results {
            let tx = block.tx_mut(receipt.tx_idx);
            tx.hash = receipt.tx_hash;
            tx.tx_type = receipt.tx_type;
            tx.from = receipt.from;
            tx.to = receipt.to;
            tx.status = receipt.status;
            tx.gas_used = receipt.gas_used;
            tx.effective_gas_price = receipt.effective_gas_price;
            tx.contract_address = receipt.contract_address;
            tx.logs = receipt.logs;
            tx.l1_base_fee_scalar = receipt.l1_base_fee_scalar;
            tx.l1_blob_base_fee = receipt.l1_blob_base_fee;
            tx.l1_blob_base_fee_scalar = receipt.l1_blob_base_fee_scalar;
            tx.l1_fee = receipt.l1_fee;
            tx.l1_gas_price = receipt.l1_gas_price;
            tx.l1_gas_used = receipt.l1_gas_used;
        }
    }
    Ok(())
}

//! Block data model.
//!
//! A [`Block`] aggregates a header and an ordered list of transactions.
//! Blocks are assembled from up to three orthogonal RPC responses: the base
//! block/header fetch populates the header (and, for full fetches, skeleton
//! transactions), while receipts, logs, or traces are stitched in afterwards
//! by `(block number, transaction index)`.

use alloy_primitives::U256;
use serde::Deserialize;
use std::collections::HashMap;

use crate::{
    codec,
    types::{Bytes, Hash32},
};

/// Index from block number to the block being enriched.
///
/// Built over exclusive borrows of the assembled slice, so grouped
/// enrichment results are applied one at a time per block.
pub type BlockMap<'a> = HashMap<u64, &'a mut Block>;

/// Block header fields as returned by `eth_getBlockByNumber`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Header {
    #[serde(default, with = "codec::hex_u64")]
    pub number: u64,
    #[serde(default)]
    pub hash: Hash32,
    #[serde(default, rename = "parentHash")]
    pub parent: Hash32,
    #[serde(default, rename = "timestamp", with = "codec::hex_u64")]
    pub time: u64,
}

/// A block: header plus ordered transactions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Block {
    #[serde(flatten)]
    pub header: Header,
    #[serde(default, rename = "transactions")]
    pub txs: Vec<Transaction>,
}

impl Block {
    /// Creates a block carrying only a number, used when no base fetch is
    /// selected and enrichment supplies the rest.
    #[must_use]
    pub fn with_number(number: u64) -> Self {
        Block { header: Header { number, ..Header::default() }, txs: Vec::new() }
    }

    /// The block number.
    #[must_use]
    pub fn num(&self) -> u64 {
        self.header.number
    }

    /// Returns the transaction at `idx`, growing the list with empty
    /// transactions as needed. Enrichment responses address transactions by
    /// index, and the base fetch may not have populated them.
    pub fn tx_mut(&mut self, idx: u64) -> &mut Transaction {
        let idx = idx as usize;
        if idx >= self.txs.len() {
            for i in self.txs.len()..=idx {
                self.txs.push(Transaction { idx: i as u64, ..Transaction::default() });
            }
        }
        &mut self.txs[idx]
    }
}

/// A transaction within a block.
///
/// The wire shape covers `eth_getBlockByNumber(.., true)` results; receipt,
/// log, and trace fields are filled in by the corresponding enrichment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Transaction {
    /// Precomputed transaction hash as reported by the upstream.
    #[serde(default)]
    pub hash: Hash32,
    #[serde(default, rename = "transactionIndex", with = "codec::hex_u64")]
    pub idx: u64,
    #[serde(default, rename = "type", with = "codec::hex_byte")]
    pub tx_type: u8,
    #[serde(default)]
    pub from: Bytes,
    #[serde(default)]
    pub to: Bytes,

    // Receipt-sourced fields; absent until a receipts enrichment runs.
    #[serde(skip)]
    pub status: u8,
    #[serde(skip)]
    pub gas_used: u64,
    #[serde(skip)]
    pub effective_gas_price: U256,
    #[serde(skip)]
    pub contract_address: Bytes,
    #[serde(skip)]
    pub logs: Vec<Log>,
    #[serde(skip)]
    pub trace_actions: Vec<TraceAction>,

    // L2 fee fields reported by OP-stack style chains; all optional.
    #[serde(skip)]
    pub l1_base_fee_scalar: Option<U256>,
    #[serde(skip)]
    pub l1_blob_base_fee: Option<U256>,
    #[serde(skip)]
    pub l1_blob_base_fee_scalar: Option<U256>,
    #[serde(skip)]
    pub l1_fee: Option<U256>,
    #[serde(skip)]
    pub l1_gas_price: Option<U256>,
    #[serde(skip)]
    pub l1_gas_used: Option<u64>,
}

/// An event log emitted by a transaction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    #[serde(default)]
    pub address: Bytes,
    #[serde(default)]
    pub topics: Vec<Hash32>,
    #[serde(default)]
    pub data: Bytes,
    #[serde(default, rename = "logIndex", with = "codec::hex_u64")]
    pub idx: u64,
}

/// A single action from an execution trace.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TraceAction {
    #[serde(default, rename = "callType")]
    pub call_type: String,
    #[serde(default)]
    pub from: Bytes,
    #[serde(default)]
    pub to: Bytes,
    #[serde(default, with = "codec::hex_u256")]
    pub value: U256,
    /// Position of this action within its transaction's trace group,
    /// assigned during enrichment rather than decoded from the wire.
    #[serde(skip)]
    pub idx: u64,
}

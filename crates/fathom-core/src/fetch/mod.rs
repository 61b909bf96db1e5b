//! Per-aspect batch fetchers and chain-continuity validation.
//!
//! Every fetcher operates over the half-open range `[start, start+limit)`
//! and must return exactly that range in order. Base fetchers (`blocks`,
//! `headers`) produce the block slice; enrichment fetchers (`receipts`,
//! `logs`, `traces`) stitch their results into an existing slice through a
//! number-indexed block map.

mod blocks;
mod logs;
mod receipts;
mod traces;

pub(crate) use blocks::{blocks, headers};
pub(crate) use logs::logs;
pub(crate) use receipts::receipts;
pub(crate) use traces::traces;

use crate::{
    block::Block,
    error::{Error, Result},
};

/// Grouping key for enrichment results: `(block number, tx index)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct TxKey {
    pub block: u64,
    pub tx: u64,
}

/// Checks that a fetched segment covers exactly the requested range and is
/// parent-hash linked throughout.
///
/// # Errors
///
/// - [`Error::EmptyResult`] if no blocks came back
/// - [`Error::RangeMismatch`] if the first or last number is wrong
/// - [`Error::CorruptSegment`] on a parent-hash discontinuity, after
///   logging the offending pair
pub(crate) fn validate(what: &'static str, start: u64, limit: u64, blocks: &[Block]) -> Result<()> {
    if blocks.is_empty() {
        return Err(Error::EmptyResult { method: what });
    }
    let first = blocks[0].num();
    if first != start {
        return Err(Error::RangeMismatch { what, requested: start, got: first });
    }
    let last = blocks[blocks.len() - 1].num();
    if last != start + limit - 1 {
        return Err(Error::RangeMismatch { what, requested: start + limit - 1, got: last });
    }
    for pair in blocks.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        if curr.header.parent != prev.header.hash {
            tracing::error!(
                num = prev.num(),
                hash = prev.header.hash.short(),
                next_num = curr.num(),
                next_parent = curr.header.parent.short(),
                next_hash = curr.header.hash.short(),
                "rpc response contains invalid data"
            );
            return Err(Error::CorruptSegment { what });
        }
    }
    Ok(())
}

//! Per-range segment cache with single-flight fetch coordination.
//!
//! Concurrent identical `(start, limit)` requests share one upstream fetch:
//! the first caller holds the segment lock across the fetch while the rest
//! queue behind it and observe the stored result. A completed segment is
//! immutable and serves up to `maxreads` readers before it is pruned; the
//! table retains at most [`SEGMENT_CAP`] segments, preferring higher
//! `start` values, which matches a forward-scanning indexer.

use parking_lot::Mutex;
use std::{collections::HashMap, future::Future, sync::Arc};

use crate::{block::Block, error::Result};

/// Maximum number of segments retained in the table.
pub const SEGMENT_CAP: usize = 5;

/// Table key: the half-open range `[start, start+limit)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SegmentKey {
    start: u64,
    limit: u64,
}

#[derive(Debug, Default)]
struct SegmentState {
    nreads: u32,
    done: bool,
    blocks: Vec<Block>,
}

/// One cached range. The async mutex is the single-flight primitive: it is
/// held across the fetch, so at most one fetch runs per segment.
#[derive(Debug, Default)]
struct Segment {
    state: tokio::sync::Mutex<SegmentState>,
}

/// Segment table. The outer mutex guards table membership only and is never
/// held across fetch I/O.
#[derive(Debug)]
pub struct RangeCache {
    maxreads: u32,
    segments: Mutex<HashMap<SegmentKey, Arc<Segment>>>,
}

impl RangeCache {
    /// Creates a range cache with the given bounded-reuse budget.
    #[must_use]
    pub fn new(maxreads: u32) -> Self {
        Self { maxreads, segments: Mutex::new(HashMap::new()) }
    }

    /// Replaces the bounded-reuse budget.
    pub fn set_max_reads(&mut self, maxreads: u32) {
        self.maxreads = maxreads;
    }

    /// Returns the blocks for `[start, start+limit)`, fetching through `f`
    /// at most once per segment lifetime.
    ///
    /// With `nocache` the fetcher is called directly and the table is left
    /// untouched. A failed fetch leaves the segment allocated but not done;
    /// the next caller retries while `nreads` keeps accumulating, so a
    /// persistently failing range is eventually reclaimed by max-reads
    /// pruning rather than pinned forever.
    ///
    /// # Errors
    ///
    /// Propagates the fetcher's error unchanged.
    pub async fn get<F, Fut>(&self, nocache: bool, start: u64, limit: u64, f: F) -> Result<Vec<Block>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Block>>>,
    {
        if nocache {
            return f().await;
        }

        let seg = {
            let mut segments = self.segments.lock();
            self.prune_max_read(&mut segments);
            let seg = segments
                .entry(SegmentKey { start, limit })
                .or_insert_with(|| Arc::new(Segment::default()))
                .clone();
            Self::prune_segments(&mut segments);
            seg
        };

        let mut state = seg.state.lock().await;
        state.nreads += 1;
        if state.done {
            tracing::debug!(start = start, limit = limit, nreads = state.nreads, "segment hit");
            return Ok(state.blocks.clone());
        }

        let blocks = f().await?;
        state.blocks = blocks;
        state.done = true;
        Ok(state.blocks.clone())
    }

    /// Drops segments whose reuse budget is exhausted. Segments whose lock
    /// is held by an in-flight fetch are skipped this round; they are
    /// revisited on the next call.
    fn prune_max_read(&self, segments: &mut HashMap<SegmentKey, Arc<Segment>>) {
        segments.retain(|_, seg| match seg.state.try_lock() {
            Ok(state) => state.nreads < self.maxreads,
            Err(_) => true,
        });
    }

    /// Caps the table at [`SEGMENT_CAP`] entries, keeping the highest
    /// `start` values.
    fn prune_segments(segments: &mut HashMap<SegmentKey, Arc<Segment>>) {
        if segments.len() <= SEGMENT_CAP {
            return;
        }
        let mut keys: Vec<SegmentKey> = segments.keys().copied().collect();
        keys.sort_by(|a, b| b.start.cmp(&a.start));
        for key in &keys[SEGMENT_CAP..] {
            segments.remove(key);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.segments.lock().len()
    }
}

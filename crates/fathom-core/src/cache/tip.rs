//! Chain-tip cache with bounded reuse.
//!
//! The cache holds the latest observed `(block number, block hash)` pair,
//! fed by a background refresher (WebSocket push or HTTP poll). Reads are
//! bounded: after `maxreads` hits the cached tip expires and the next read
//! misses. A refresher failure parks an error in the cache; the next read
//! consumes it, reports a miss, and re-arms the one-shot so a fresh
//! refresher can be launched.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{error::Error, types::Hash32};

#[derive(Debug, Default)]
struct TipState {
    num: u64,
    hash: [u8; 32],
    nreads: u32,
    maxreads: u32,
    err: Option<Error>,
}

/// Latest-block cache shared between callers and the background refresher.
#[derive(Debug)]
pub struct TipCache {
    state: Mutex<TipState>,
    started: AtomicBool,
}

impl TipCache {
    /// Creates a tip cache with the given bounded-reuse budget.
    #[must_use]
    pub fn new(maxreads: u32) -> Self {
        Self {
            state: Mutex::new(TipState { maxreads, ..TipState::default() }),
            started: AtomicBool::new(false),
        }
    }

    /// Replaces the bounded-reuse budget.
    pub fn set_max_reads(&self, maxreads: u32) {
        self.state.lock().maxreads = maxreads;
    }

    /// Arms the refresher one-shot. Returns `true` for exactly one caller
    /// per armed period; that caller must launch the refresher.
    pub fn try_start(&self) -> bool {
        self.started.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_ok()
    }

    /// Records a newer tip. Updates only when `num` is strictly greater than
    /// the cached number, so duplicate or stale notifications are ignored;
    /// an accepted update resets the read count.
    pub fn update(&self, num: u64, hash: Hash32) {
        let mut state = self.state.lock();
        if num <= state.num {
            return;
        }
        state.nreads = 0;
        state.num = num;
        state.hash = hash.0;
    }

    /// Records a refresher failure and resets the read count. The error is
    /// surfaced (as a miss) to the next reader.
    pub fn error(&self, err: Error) {
        let mut state = self.state.lock();
        state.nreads = 0;
        state.err = Some(err);
    }

    /// Returns the cached tip if `n > 0`, the cached number covers `n`, and
    /// the reuse budget is not exhausted. Hits return a copy of the hash.
    ///
    /// A parked refresher error is consumed here: it is logged, cleared, and
    /// the one-shot re-armed, and the call reports a miss so the caller
    /// fetches directly and relaunches the refresher.
    pub fn get(&self, n: u64) -> Option<(u64, Hash32)> {
        let mut state = self.state.lock();

        if let Some(err) = state.err.take() {
            if err.is_connection_reset() {
                tracing::debug!("rpc connection reset");
            } else {
                tracing::debug!(error = %err, "rpc connection error");
            }
            self.started.store(false, Ordering::Release);
            return None;
        }

        if n == 0 || state.num < n {
            tracing::debug!(n = n, latest = state.num, "latest cache miss");
            return None;
        }

        if state.nreads >= state.maxreads {
            tracing::debug!(
                n = n,
                latest = state.num,
                nreads = state.nreads,
                maxreads = state.maxreads,
                "expiring latest cache"
            );
            state.nreads = 0;
            state.num = 0;
            state.hash = [0u8; 32];
            return None;
        }

        state.nreads += 1;
        tracing::debug!(n = n, latest = state.num, nreads = state.nreads, "latest cache hit");
        Some((state.num, Hash32(state.hash)))
    }
}

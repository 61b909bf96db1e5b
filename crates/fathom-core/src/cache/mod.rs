//! Caching layers: the chain-tip cache and the per-range segment cache.
//!
//! Both caches bound reuse by read count rather than by time: a cached value
//! may be observed at most `maxreads` times before the next reader is forced
//! back to the upstream.

pub mod range;
pub mod tip;

pub use range::RangeCache;
pub use tip::TipCache;

/// Default bounded-reuse budget for both caches.
pub const DEFAULT_MAX_READS: u32 = 20;

//! # Fathom
//!
//! A batched, cache-coordinated Ethereum JSON-RPC fetch client for
//! downstream indexing pipelines. Fathom presents a chain-validated
//! sequence of blocks over a requested half-open range `[start,
//! start+limit)` while minimizing redundant upstream work under concurrent
//! readers.
//!
//! The crate is organized around six cooperating pieces:
//!
//! - **[`transport`]**: single and batch JSON-RPC over HTTP with positional
//!   response correlation, gzip, and a fixed per-call budget.
//!
//! - **[`cache::tip`]**: the latest-block cache, refreshed by a `newHeads`
//!   WebSocket subscription or an HTTP poller, with read-count bounded
//!   reuse.
//!
//! - **[`cache::range`]**: per-`(start, limit)` segment memoization with
//!   single-flight fetch coordination and high-`start` retention.
//!
//! - **`fetch`** (internal): per-aspect batch fetchers (blocks, headers,
//!   receipts, logs, traces) with chain-continuity validation.
//!
//! - **[`client`]**: the public surface: `get`, `latest`, `hash`, and
//!   atomic round-robin endpoint rotation.
//!
//! - **[`block`]** / **[`filter`]**: the block aggregate being assembled
//!   and the aspect selector that drives assembly.
//!
//! ## Request flow
//!
//! ```text
//! caller ──► Client::get ──► RangeCache(start, limit) ──► fetchers ──► Transport ──► RPC
//!                │                                            │
//!                └── enrichment (receipts | logs | traces) ───┘
//!
//! tip source (WS push | HTTP poll) ──► TipCache ◄── Client::latest
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use fathom_core::{Client, Ctx, Filter};
//!
//! # async fn example() -> fathom_core::Result<()> {
//! let client = Client::new(&["https://eth.example.com/rpc"])?.with_max_reads(20);
//! let ctx = Ctx::new();
//! let endpoint = client.next_endpoint().clone();
//!
//! let (tip, _hash) = client.latest(&ctx, &endpoint, 0).await?;
//! let blocks = client.get(&ctx, &endpoint, &Filter::blocks(), tip - 10, 10).await?;
//! assert_eq!(blocks.len(), 10);
//! # Ok(())
//! # }
//! ```

pub mod block;
pub mod cache;
pub mod client;
pub mod codec;
pub mod ctx;
pub mod endpoint;
pub mod error;
mod fetch;
pub mod filter;
pub mod transport;
pub mod types;
mod ws;

pub use block::{Block, Header, Log, TraceAction, Transaction};
pub use client::Client;
pub use ctx::Ctx;
pub use endpoint::Endpoint;
pub use error::{Error, Result};
pub use filter::Filter;
pub use types::Hash32;

//! Fetch filters: which aspects of a block range to retrieve.
//!
//! The primary aspect is picked by the first set flag of blocks → headers;
//! enrichment picks the first of receipts → logs → traces. Log fetches also
//! carry address and topic selectors forwarded to `eth_getLogs`.

/// Declares the aspects to fetch and the log selectors to apply.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    pub use_blocks: bool,
    pub use_headers: bool,
    pub use_receipts: bool,
    pub use_logs: bool,
    pub use_traces: bool,
    addresses: Vec<String>,
    topics: Vec<Vec<String>>,
}

impl Filter {
    /// Full blocks with transactions.
    #[must_use]
    pub fn blocks() -> Self {
        Filter { use_blocks: true, ..Filter::default() }
    }

    /// Headers only.
    #[must_use]
    pub fn headers() -> Self {
        Filter { use_headers: true, ..Filter::default() }
    }

    /// Headers enriched with full receipts.
    #[must_use]
    pub fn receipts() -> Self {
        Filter { use_headers: true, use_receipts: true, ..Filter::default() }
    }

    /// Event logs matching the given selectors, stitched into synthetic
    /// blocks unless combined with a base aspect.
    #[must_use]
    pub fn logs(addresses: Vec<String>, topics: Vec<Vec<String>>) -> Self {
        Filter { use_logs: true, addresses, topics, ..Filter::default() }
    }

    /// Execution traces.
    #[must_use]
    pub fn traces() -> Self {
        Filter { use_traces: true, ..Filter::default() }
    }

    /// Adds a base aspect to an enrichment filter.
    #[must_use]
    pub fn with_blocks(mut self) -> Self {
        self.use_blocks = true;
        self
    }

    /// Adds a headers base aspect to an enrichment filter.
    #[must_use]
    pub fn with_headers(mut self) -> Self {
        self.use_headers = true;
        self
    }

    /// Contract address selectors for `eth_getLogs`.
    #[must_use]
    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    /// Topic selectors for `eth_getLogs`: one list per topic position.
    #[must_use]
    pub fn topics(&self) -> &[Vec<String>] {
        &self.topics
    }
}

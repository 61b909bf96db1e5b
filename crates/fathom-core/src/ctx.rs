//! Per-call request context: cancellation plus a request-count side channel.
//!
//! The counter lets the downstream pipeline account for upstream requests
//! without threading a metrics handle through every call site. Background
//! refreshers run under [`Ctx::background`], detached from the caller that
//! launched them.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio_util::sync::CancellationToken;

/// Cancellation and request-accounting carrier passed through every call.
#[derive(Debug, Clone, Default)]
pub struct Ctx {
    cancel: CancellationToken,
    counter: Option<Arc<AtomicU64>>,
}

impl Ctx {
    /// Creates a context with no counter attached.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detached context for long-lived background tasks.
    ///
    /// Canceling any individual caller's context must not stop a refresher
    /// that serves all future callers.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Attaches a shared request counter.
    #[must_use]
    pub fn with_counter(mut self, counter: Arc<AtomicU64>) -> Self {
        self.counter = Some(counter);
        self
    }

    /// Requests cancellation of all calls carrying this context.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Resolves when this context has been canceled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }

    /// Returns `true` if cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Records one completed upstream request.
    pub fn count_request(&self) {
        if let Some(counter) = &self.counter {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }
}

use crate::error::Result;
use crate::services::loader::SearchSource;
use crate::services::upstream::SearchQuote;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::{sleep, Duration};
use tracing::debug;

/// Debounced symbol search
///
/// Each call waits for `quiet` before hitting the source. If another call
/// arrives in the meantime (or while the fetch is in flight) the earlier
/// call yields `None` and its response, if any, is dropped.
pub struct SearchDebouncer<S> {
    source: S,
    quiet: Duration,
    generation: AtomicU64,
}

impl<S: SearchSource> SearchDebouncer<S> {
    pub fn new(source: S, quiet: Duration) -> Self {
        Self {
            source,
            quiet,
            generation: AtomicU64::new(0),
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// `None` means a newer query superseded this one
    pub async fn search(&self, query: &str) -> Option<Result<Vec<SearchQuote>>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let query = query.trim();

        // Blank input still cancels anything pending
        if query.is_empty() {
            return Some(Ok(Vec::new()));
        }

        sleep(self.quiet).await;
        if !self.is_current(generation) {
            debug!(query, generation, "Search superseded before fetch");
            return None;
        }

        let result = self.source.search(query).await;
        if !self.is_current(generation) {
            debug!(query, generation, "Search superseded during fetch");
            return None;
        }

        Some(result)
    }
}

//! Parallel predicate counting.
//!
//! `aggregate` splits a collection into a bounded number of contiguous
//! chunks, evaluates every predicate of a table on each item from scoped
//! worker threads, and returns per-column counts once every worker has
//! finished. Counters live inside a single call, so two calls never share
//! state.

use super::predicates::PredicateTable;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Upper bound on workers for a single aggregation.
pub const MAX_WORKERS: usize = 256;

/// Default worker fan-out.
pub const DEFAULT_WORKERS: usize = 16;

/// Bounded fan-out width for one aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parallelism {
    workers: usize,
}

impl Parallelism {
    /// Creates a fan-out width, clamped to `1..=MAX_WORKERS`.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.clamp(1, MAX_WORKERS),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Number of items each worker handles for a collection of `len` items.
    fn chunk_size(&self, len: usize) -> usize {
        len.div_ceil(self.workers).max(1)
    }
}

impl Default for Parallelism {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

/// Aggregation was abandoned because the cancellation token fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("aggregation cancelled")]
pub struct Cancelled;

/// Per-column counts for one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counts {
    /// Number of items in the collection.
    pub total: u64,
    /// Column name to number of matching items, in table order.
    pub by_column: Vec<(&'static str, u64)>,
}

impl Counts {
    /// Returns the count for a column, if the table defines it.
    #[cfg(test)]
    pub fn get(&self, column: &str) -> Option<u64> {
        self.by_column
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, v)| *v)
    }
}

/// Count how many items satisfy each predicate of `table`.
///
/// Blocks until all workers finish. The result does not depend on the
/// fan-out width or on worker scheduling. Returns `Err(Cancelled)` without
/// counts if `cancel` fires before the pass completes.
pub fn aggregate<T: Sync>(
    items: &[T],
    table: PredicateTable<T>,
    parallelism: Parallelism,
    cancel: &CancellationToken,
) -> Result<Counts, Cancelled> {
    let counters: Vec<AtomicU64> = table.iter().map(|_| AtomicU64::new(0)).collect();

    if !items.is_empty() {
        let chunk_size = parallelism.chunk_size(items.len());
        debug!(
            "Aggregating {} items over {} columns in chunks of {}",
            items.len(),
            table.len(),
            chunk_size
        );

        std::thread::scope(|scope| {
            for chunk in items.chunks(chunk_size) {
                let counters = &counters;
                scope.spawn(move || {
                    for item in chunk {
                        if cancel.is_cancelled() {
                            return;
                        }
                        for ((_, predicate), counter) in table.iter().zip(counters) {
                            if predicate(item) {
                                counter.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                    }
                });
            }
        });
    }

    if cancel.is_cancelled() {
        return Err(Cancelled);
    }

    let by_column = table
        .iter()
        .zip(counters)
        .map(|((name, _), counter)| (*name, counter.into_inner()))
        .collect();

    Ok(Counts {
        total: items.len() as u64,
        by_column,
    })
}

//! The sampling loop.
//!
//! Each cycle lists machines and nodeclaims from the resource store,
//! counts both collections against their predicate tables, and hands the
//! resulting snapshot to the emitter. A failed fetch abandons the cycle and
//! retries right away (bounded by a per-second retry budget); a successful
//! cycle is followed by a fixed sleep. Emission failures end the run.

mod retry;

use crate::analysis::predicates::{
    NODECLAIM_PREDICATES, NODECLAIM_TOTAL_COLUMN, NODE_PREDICATES, NODE_TOTAL_COLUMN,
};
use crate::analysis::{aggregate, Cancelled, Counts, Parallelism};
use crate::models::Snapshot;
use crate::report::Emitter;
use crate::store::{ResourceKind, ResourceStore, StoreError};
use anyhow::{Context, Result};
use chrono::Local;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use self::retry::RetryBudget;

/// Default time between the end of one emission and the next fetch.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Default cap on immediate retries of failed cycles per second.
pub const DEFAULT_MAX_RETRIES_PER_SECOND: u32 = 20;

/// Settings for the sampling loop.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub interval: Duration,
    pub parallelism: Parallelism,
    pub max_retries_per_second: u32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            parallelism: Parallelism::default(),
            max_retries_per_second: DEFAULT_MAX_RETRIES_PER_SECOND,
        }
    }
}

/// Why a single cycle produced no snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("failed to list {kind}: {source}")]
    Fetch {
        kind: ResourceKind,
        #[source]
        source: StoreError,
    },

    #[error("sampling cancelled")]
    Cancelled,

    #[error("sampling task panicked: {0}")]
    Panicked(#[from] JoinError),
}

impl From<Cancelled> for SampleError {
    fn from(_: Cancelled) -> Self {
        SampleError::Cancelled
    }
}

/// Totals for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Cycles that produced a row.
    pub cycles: u64,
    /// Cycles abandoned because a fetch failed.
    pub skipped: u64,
}

/// Drives fetch → aggregate → emit cycles against a resource store.
pub struct Sampler {
    store: Arc<dyn ResourceStore>,
    config: SamplerConfig,
}

impl Sampler {
    pub fn new(store: Arc<dyn ResourceStore>, config: SamplerConfig) -> Self {
        Self { store, config }
    }

    /// Run cycles until `cancel` fires or emission fails.
    pub async fn run(&self, emitter: &mut Emitter, cancel: &CancellationToken) -> Result<RunStats> {
        info!(
            "Sampling every {:?} with {} workers",
            self.config.interval,
            self.config.parallelism.workers()
        );

        let mut retries = RetryBudget::per_second(self.config.max_retries_per_second);
        let mut stats = RunStats::default();

        while !cancel.is_cancelled() {
            let snapshot = match self.sample_once(cancel).await {
                Ok(snapshot) => snapshot,
                Err(SampleError::Cancelled) => break,
                Err(SampleError::Fetch { kind, source }) => {
                    stats.skipped += 1;
                    debug!("Skipping cycle, failed to list {}: {}", kind, source);

                    if let Some(wait) = retries.record_failure(Instant::now()) {
                        warn!(
                            "Resource store keeps failing ({}), pausing retries for {:?}",
                            source, wait
                        );
                        if !sleep_or_cancel(wait, cancel).await {
                            break;
                        }
                    }
                    continue;
                }
                Err(e @ SampleError::Panicked(_)) => return Err(e.into()),
            };

            emitter
                .emit(&snapshot)
                .context("Failed to record sample; stopping")?;
            stats.cycles += 1;
            retries.mark_success(Instant::now());

            if !sleep_or_cancel(self.config.interval, cancel).await {
                break;
            }
        }

        debug!("Sampler stopped, {} rows written", emitter.rows_written());
        Ok(stats)
    }

    /// Run one fetch and aggregation pass and build its snapshot.
    pub async fn sample_once(&self, cancel: &CancellationToken) -> Result<Snapshot, SampleError> {
        let machines = self
            .fetch(ResourceKind::Machine, cancel, |store| store.list_machines())
            .await?;
        let claims = self
            .fetch(ResourceKind::NodeClaim, cancel, |store| {
                store.list_node_claims()
            })
            .await?;

        let parallelism = self.config.parallelism;
        let node_cancel = cancel.clone();
        let claim_cancel = cancel.clone();
        let node_task = tokio::task::spawn_blocking(move || {
            aggregate(&machines, NODE_PREDICATES, parallelism, &node_cancel)
        });
        let claim_task = tokio::task::spawn_blocking(move || {
            aggregate(&claims, NODECLAIM_PREDICATES, parallelism, &claim_cancel)
        });

        let (nodes, claims) = futures::future::try_join(node_task, claim_task).await?;
        let snapshot = assemble(nodes?, claims?);

        debug!(
            "Sampled {} nodes and {} nodeclaims",
            snapshot.get(NODE_TOTAL_COLUMN).unwrap_or_default(),
            snapshot.get(NODECLAIM_TOTAL_COLUMN).unwrap_or_default()
        );
        Ok(snapshot)
    }

    /// List one resource kind on the blocking pool, racing cancellation.
    ///
    /// A cancelled fetch is abandoned; the blocking read finishes on its own
    /// and its result is dropped.
    async fn fetch<T, F>(
        &self,
        kind: ResourceKind,
        cancel: &CancellationToken,
        list: F,
    ) -> Result<Vec<T>, SampleError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn ResourceStore) -> Result<Vec<T>, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let task = tokio::task::spawn_blocking(move || list(store.as_ref()));

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SampleError::Cancelled),
            joined = task => joined?.map_err(|source| SampleError::Fetch { kind, source }),
        }
    }
}

/// Build a snapshot in header order from the two collections' counts.
fn assemble(nodes: Counts, claims: Counts) -> Snapshot {
    let mut values = Vec::with_capacity(2 + nodes.by_column.len() + claims.by_column.len());
    values.push((NODE_TOTAL_COLUMN, nodes.total));
    values.extend(nodes.by_column);
    values.push((NODECLAIM_TOTAL_COLUMN, claims.total));
    values.extend(claims.by_column);

    Snapshot {
        taken_at: Local::now(),
        values,
    }
}

/// Sleep for `duration`. Returns `false` if cancelled first.
async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

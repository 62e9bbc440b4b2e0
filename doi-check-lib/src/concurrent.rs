//! Concurrent resolution engine.
//!
//! Fans a DOI list out over the resolution checker with a fixed worker limit
//! and collects results in completion order. Retry and timeout handling live
//! in the checker; the engine only schedules, observes and collects.

use crate::protocols::ResolverClient;
use crate::report::{ReportTable, SummaryCounts};
use crate::types::{Doi, ResolutionResult};
use futures::stream::{self, StreamExt};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Receives progress from a running engine.
///
/// `on_result` fires once per completed DOI, in completion order, with the
/// number of completions so far. `on_complete` fires exactly once after the
/// last result (or after cancellation).
pub trait RunObserver {
    fn on_result(&mut self, completed: usize, total: usize, result: &ResolutionResult);

    fn on_complete(&mut self, _table: &ReportTable, _summary: &SummaryCounts, _cancelled: bool) {}
}

impl<F> RunObserver for F
where
    F: FnMut(usize, usize, &ResolutionResult),
{
    fn on_result(&mut self, completed: usize, total: usize, result: &ResolutionResult) {
        self(completed, total, result)
    }
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {
    fn on_result(&mut self, _completed: usize, _total: usize, _result: &ResolutionResult) {}
}

/// Runs resolution checks with bounded parallelism.
#[derive(Clone)]
pub struct ResolutionEngine {
    resolver: ResolverClient,
}

impl ResolutionEngine {
    pub fn new(resolver: ResolverClient) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &ResolverClient {
        &self.resolver
    }

    /// Check every DOI and return the full table.
    pub async fn run_all<O>(&self, dois: &[Doi], max_workers: usize, observer: &mut O) -> ReportTable
    where
        O: RunObserver + ?Sized,
    {
        self.run_all_with_cancel(dois, max_workers, &CancellationToken::new(), observer)
            .await
    }

    /// Check every DOI until done or until `cancel` fires.
    ///
    /// At most `max_workers` checks are in flight; the rest wait their turn in
    /// submission order. Results are appended by this loop alone, so the
    /// table needs no locking. On cancellation no new checks start, in-flight
    /// checks are dropped and the partial table is returned.
    pub async fn run_all_with_cancel<O>(
        &self,
        dois: &[Doi],
        max_workers: usize,
        cancel: &CancellationToken,
        observer: &mut O,
    ) -> ReportTable
    where
        O: RunObserver + ?Sized,
    {
        let total = dois.len();
        let workers = max_workers.max(1);
        let started = Instant::now();
        let mut table = ReportTable::with_capacity(total);
        let mut cancelled = false;

        info!(total, workers, "starting resolution run");

        // Checks own their DOI and resolver handle.
        let checks: Vec<_> = dois
            .iter()
            .cloned()
            .map(|doi| {
                let resolver = self.resolver.clone();
                async move { resolver.check(&doi).await }
            })
            .collect();
        let mut results = stream::iter(checks).buffer_unordered(workers);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                next = results.next() => match next {
                    Some(result) => {
                        table.push(result);
                        if let Some(latest) = table.last() {
                            observer.on_result(table.len(), total, latest);
                        }
                    }
                    None => break,
                },
            }
        }
        drop(results);

        let summary = table.summarize();
        if cancelled {
            info!(completed = table.len(), total, "resolution run cancelled");
        } else {
            debug!(elapsed_ms = started.elapsed().as_millis() as u64, "resolution run finished");
        }
        info!(
            resolved = summary.resolved,
            unresolved = summary.unresolved,
            "resolution summary"
        );

        observer.on_complete(&table, &summary, cancelled);
        table
    }
}

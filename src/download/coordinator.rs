use crate::download::fetcher::AssetFetcher;
use crate::download::outcome::{BatchReport, DownloadOutcome};
use crate::download::task::{CategoryBatch, DownloadTask};
use crate::error::FetchError;
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub const DEFAULT_CONCURRENCY: usize = 5;

/// Runs category batches through an [`AssetFetcher`] with bounded parallelism.
pub struct Coordinator<F> {
    fetcher: F,
    concurrency_limit: usize,
    cancel: CancellationToken,
}

impl<F: AssetFetcher> Coordinator<F> {
    /// A limit of zero is treated as one.
    pub fn new(fetcher: F, concurrency_limit: usize) -> Self {
        Self {
            fetcher,
            concurrency_limit: concurrency_limit.max(1),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    #[cfg(test)]
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch every task of `batch` and wait for all of them.
    ///
    /// Tasks start in batch order and are reported as they finish. Tasks that
    /// have not started when the cancellation token fires are reported as
    /// cancelled failures; running ones are left to finish.
    pub async fn run(&self, batch: CategoryBatch, progress: &ProgressBar) -> BatchReport {
        let CategoryBatch { category, tasks } = batch;
        let total = tasks.len();
        // Settle duplicate file names up front so no two tasks share a staging path
        let (to_fetch, mut outcomes) = resolve_collisions(tasks);

        info!(
            category = %category,
            total,
            limit = self.concurrency_limit(),
            "Downloading {} images",
            to_fetch.len()
        );
        progress.inc(outcomes.len() as u64);

        // Start tasks in batch order, at most `concurrency_limit` at a time
        let fetched: Vec<DownloadOutcome> = stream::iter(to_fetch)
            .map(|task| async move {
                if self.cancel.is_cancelled() {
                    return DownloadOutcome::failed(task, FetchError::Cancelled);
                }
                self.fetcher.fetch(task).await
            })
            .buffer_unordered(self.concurrency_limit)
            .inspect(|_| progress.inc(1))
            .collect()
            .await;
        outcomes.extend(fetched);

        progress.finish();
        let batch_report = BatchReport { category, outcomes };

        // Report failures once everything is done
        for failure in batch_report.failures() {
            if let Some(e) = failure.error.as_ref().filter(|e| !matches!(e, FetchError::Cancelled)) {
                warn!(url = failure.task.source_url(), "Error downloading image: {}", e);
            }
        }
        info!(category = %category, "Finished downloading: {}", batch_report.summary());
        batch_report
    }
}

/// Apply the duplicate-name policy to a batch.
///
/// The first task for a derived name is kept for fetching. A later task with
/// the same URL is skipped; a later task with a different URL fails with
/// `NameCollision`. Tasks without a derived name pass through untouched.
fn resolve_collisions(tasks: Vec<DownloadTask>) -> (Vec<DownloadTask>, Vec<DownloadOutcome>) {
    let mut kept: HashMap<String, String> = HashMap::new();
    let mut to_fetch = Vec::with_capacity(tasks.len());
    let mut resolved = Vec::new();

    for task in tasks {
        let Some(name) = task.derived_file_name().map(str::to_owned) else {
            to_fetch.push(task);
            continue;
        };
        match kept.get(&name) {
            None => {
                kept.insert(name, task.source_url().to_string());
                to_fetch.push(task);
            }
            Some(kept_url) if kept_url == task.source_url() => {
                resolved.push(DownloadOutcome::skipped(task));
            }
            Some(kept_url) => {
                let error = FetchError::NameCollision {
                    file_name: name,
                    kept_url: kept_url.clone(),
                };
                resolved.push(DownloadOutcome::failed(task, error));
            }
        }
    }

    (to_fetch, resolved)
}

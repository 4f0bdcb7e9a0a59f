use crate::catalog::Category;
use crate::download::task::DownloadTask;
use crate::error::FetchError;
use std::fmt;
use std::ops::AddAssign;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// The canonical file was already there, or another task covers it
    Skipped,
    Downloaded,
    Failed,
}

/// Terminal result of one task. Owned by whoever aggregates the batch.
#[derive(Debug)]
pub struct DownloadOutcome {
    pub task: DownloadTask,
    pub status: OutcomeStatus,
    pub error: Option<FetchError>,
}

impl DownloadOutcome {
    pub fn skipped(task: DownloadTask) -> Self {
        Self {
            task,
            status: OutcomeStatus::Skipped,
            error: None,
        }
    }

    pub fn downloaded(task: DownloadTask) -> Self {
        Self {
            task,
            status: OutcomeStatus::Downloaded,
            error: None,
        }
    }

    pub fn failed(task: DownloadTask, error: FetchError) -> Self {
        Self {
            task,
            status: OutcomeStatus::Failed,
            error: Some(error),
        }
    }
}

/// Per-status counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub skipped: usize,
    pub downloaded: usize,
    pub failed: usize,
}

impl Summary {
    pub fn record(&mut self, status: OutcomeStatus) {
        match status {
            OutcomeStatus::Skipped => self.skipped += 1,
            OutcomeStatus::Downloaded => self.downloaded += 1,
            OutcomeStatus::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.skipped + self.downloaded + self.failed
    }
}

impl AddAssign for Summary {
    fn add_assign(&mut self, other: Summary) {
        self.skipped += other.skipped;
        self.downloaded += other.downloaded;
        self.failed += other.failed;
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} downloaded, {} skipped, {} failed",
            self.downloaded, self.skipped, self.failed
        )
    }
}

/// All outcomes of one category batch, in completion order.
#[derive(Debug)]
pub struct BatchReport {
    pub category: Category,
    pub outcomes: Vec<DownloadOutcome>,
}

impl BatchReport {
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for outcome in &self.outcomes {
            summary.record(outcome.status);
        }
        summary
    }

    pub fn failures(&self) -> impl Iterator<Item = &DownloadOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status == OutcomeStatus::Failed)
    }
}

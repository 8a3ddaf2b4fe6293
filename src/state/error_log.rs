use crate::output::{TaskError, TaskFailure};
use std::sync::{Mutex, PoisonError};

/// Collects per-URL failures reported by the workers of a run
///
/// Workers only append; the coordinator drains the log once the run has terminated.
#[derive(Debug, Default)]
pub struct ErrorLog {
    failures: Mutex<Vec<TaskFailure>>,
}

impl ErrorLog {
    /// Creates an empty error log
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure for `url` processed by `worker_id`
    pub fn record(&self, url: &str, worker_id: usize, error: TaskError) {
        tracing::warn!(
            "Error crawling url: {}, worker: {}, error: {}",
            url,
            worker_id,
            error
        );

        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(TaskFailure {
                url: url.to_string(),
                worker_id,
                error,
            });
    }

    /// Number of failures recorded so far
    pub fn len(&self) -> usize {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no failure has been recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Takes every recorded failure out of the log
    pub fn drain(&self) -> Vec<TaskFailure> {
        std::mem::take(&mut *self.failures.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

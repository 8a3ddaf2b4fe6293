//! Crawl run reports
//!
//! A report is produced once per run after every worker has exited. It carries the
//! aggregate counters, the final visited set, and every per-URL failure.

use crate::crawler::{ExtractError, FetchError};
use crate::output::SinkError;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use thiserror::Error;

/// Error that ended the processing of a single URL
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ExtractError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl TaskError {
    /// Short name of the failing stage
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch",
            Self::Parse(_) => "parse",
            Self::Sink(_) => "sink",
        }
    }
}

/// A failed crawl task
#[derive(Debug)]
pub struct TaskFailure {
    /// The URL that failed
    pub url: String,

    /// The worker that processed it (1-based)
    pub worker_id: usize,

    /// What went wrong
    pub error: TaskError,
}

/// Summary of a finished crawl run
#[derive(Debug)]
pub struct CrawlReport {
    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the last worker exited
    pub finished_at: DateTime<Utc>,

    /// Number of workers in the pool
    pub worker_count: usize,

    /// Number of URLs dequeued and processed, successfully or not
    pub pages_crawled: u64,

    /// Number of documents accepted by the sink
    pub documents_emitted: u64,

    /// Number of discovered links claimed and enqueued
    pub links_enqueued: u64,

    /// Number of discovered links dropped because the frontier was full
    pub links_dropped: u64,

    /// Every URL claimed during the run, sorted
    pub visited: Vec<String>,

    /// Per-URL failures
    pub failures: Vec<TaskFailure>,
}

impl CrawlReport {
    /// Returns true if no task failed
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns the number of failed tasks
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Counts failures per stage (`fetch`, `parse`, `sink`)
    pub fn failures_by_kind(&self) -> HashMap<&'static str, usize> {
        let mut counts = HashMap::new();
        for failure in &self.failures {
            *counts.entry(failure.error.kind()).or_insert(0) += 1;
        }
        counts
    }

    /// Wall-clock duration of the run
    pub fn duration(&self) -> Duration {
        self.finished_at - self.started_at
    }

    /// Returns the success rate as a percentage of crawled pages
    pub fn success_rate(&self) -> f64 {
        if self.pages_crawled == 0 {
            return 0.0;
        }
        (self.documents_emitted as f64 / self.pages_crawled as f64) * 100.0
    }
}

/// Prints a report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Overview:");
    println!("  Started: {}", report.started_at.to_rfc3339());
    println!("  Finished: {}", report.finished_at.to_rfc3339());
    println!(
        "  Duration: {:.1}s",
        report.duration().num_milliseconds() as f64 / 1000.0
    );
    println!("  Workers: {}", report.worker_count);
    println!("  URLs visited: {}", report.visited.len());
    println!("  Pages crawled: {}", report.pages_crawled);
    println!("  Documents indexed: {}", report.documents_emitted);
    println!("  Links enqueued: {}", report.links_enqueued);
    if report.links_dropped > 0 {
        println!("  Links dropped (frontier full): {}", report.links_dropped);
    }
    println!();

    if !report.failures.is_empty() {
        println!("Failures by Stage:");
        let mut counts: Vec<_> = report.failures_by_kind().into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        for (kind, count) in counts {
            println!("  {}: {}", kind, count);
        }
        println!();

        println!("Failures ({}):", report.failures.len());
        for failure in &report.failures {
            println!(
                "  - {} (worker {}): {}",
                failure.url, failure.worker_id, failure.error
            );
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages indexed)",
        report.success_rate(),
        report.documents_emitted,
        report.pages_crawled
    );
}

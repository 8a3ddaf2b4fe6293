//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the worker pool that drives a crawl run:
//! - Claiming and queueing the seed URLs
//! - Spawning a fixed number of workers over a shared frontier
//! - Per URL: fetch, streaming extraction, document delivery, link admission
//! - Collecting per-URL failures and producing the run report
//!
//! A run ends when the frontier is empty and no URL is in flight. Every worker then
//! observes the terminated frontier and exits; `run` returns once all of them have.

use crate::config::{Config, CrawlerConfig, MAX_WORKERS};
use crate::crawler::extractor::{extract_stream, DiscoveredLinks};
use crate::crawler::fetcher::{build_http_client, HttpFetcher, PageSource};
use crate::crawler::frontier::{Frontier, FrontierError};
use crate::output::{CrawlReport, Document, DocumentSink, HttpIndexSink, TaskError};
use crate::state::{ErrorLog, VisitedSet};
use crate::storage::UrlStore;
use crate::{ConfigError, CrawlerError};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// How often (in processed pages) a progress line is logged
const PROGRESS_INTERVAL: u64 = 100;

/// Counters kept by a single worker and merged at the end of the run
#[derive(Debug, Default, Clone, Copy)]
struct WorkerStats {
    pages_crawled: u64,
    documents_emitted: u64,
    links_enqueued: u64,
    links_dropped: u64,
}

impl WorkerStats {
    fn merge(&mut self, other: WorkerStats) {
        self.pages_crawled += other.pages_crawled;
        self.documents_emitted += other.documents_emitted;
        self.links_enqueued += other.links_enqueued;
        self.links_dropped += other.links_dropped;
    }
}

/// State shared by every worker of one run
struct RunContext {
    frontier: Arc<Frontier>,
    visited: VisitedSet,
    errors: ErrorLog,
    source: Arc<dyn PageSource>,
    sink: Arc<dyn DocumentSink>,
    store: Option<Arc<Mutex<dyn UrlStore>>>,
    processed: AtomicU64,
}

impl RunContext {
    /// Fetches, extracts and delivers one page, returning the links it contains
    async fn process_url(&self, url: &str) -> Result<DiscoveredLinks, TaskError> {
        let body = self.source.fetch(url).await?;
        let extraction = extract_stream(body, url).await?;

        let document = Document::new(url, extraction.text);
        self.sink.submit(&document).await?;

        Ok(extraction.links)
    }

    /// Claims and queues newly discovered links
    ///
    /// Links are only claimed together with a successful push, so a link dropped for lack
    /// of space can still be admitted when another page links to it later.
    fn admit_links(&self, links: DiscoveredLinks, stats: &mut WorkerStats) {
        for link in links {
            match self.frontier.admit(&link, &self.visited) {
                Ok(true) => {
                    stats.links_enqueued += 1;
                    self.record_discovery(&link);
                }
                Ok(false) => {}
                Err(FrontierError::Full(link)) => {
                    tracing::warn!("Frontier is full, dropping link {}", link);
                    stats.links_dropped += 1;
                }
                Err(e @ FrontierError::Closed(_)) => {
                    tracing::debug!("{}", e);
                }
            }
        }
    }

    /// Records a newly claimed URL in the store, if one is attached
    fn record_discovery(&self, url: &str) {
        let Some(store) = &self.store else {
            return;
        };

        let result = store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert_url(url);

        if let Err(e) = result {
            tracing::error!("Failed to record {} in store: {}", url, e);
        }
    }

    fn log_progress(&self) {
        let processed = self.processed.fetch_add(1, Ordering::Relaxed) + 1;
        if processed % PROGRESS_INTERVAL == 0 {
            tracing::info!(
                "Progress: {} pages processed, {} queued, {} in flight, {} visited",
                processed,
                self.frontier.pending(),
                self.frontier.in_flight(),
                self.visited.len()
            );
        }
    }
}

/// Runs one worker until the frontier terminates
async fn run_worker(worker_id: usize, ctx: Arc<RunContext>) -> WorkerStats {
    let mut stats = WorkerStats::default();
    tracing::debug!("Worker {} started", worker_id);

    while let Some(lease) = ctx.frontier.next().await {
        tracing::debug!("Worker {} processing {}", worker_id, lease.url());
        stats.pages_crawled += 1;

        match ctx.process_url(lease.url()).await {
            Ok(links) => {
                stats.documents_emitted += 1;
                ctx.admit_links(links, &mut stats);
            }
            Err(e) => ctx.errors.record(lease.url(), worker_id, e),
        }

        ctx.log_progress();

        // Completing the lease after admission keeps the run alive until the links are queued
        drop(lease);
    }

    tracing::debug!("Worker {} exiting", worker_id);
    stats
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: CrawlerConfig,
    source: Arc<dyn PageSource>,
    sink: Arc<dyn DocumentSink>,
    store: Option<Arc<Mutex<dyn UrlStore>>>,
}

impl Coordinator {
    /// Creates a coordinator from its collaborators
    ///
    /// # Arguments
    ///
    /// * `config` - Worker count and frontier capacity
    /// * `source` - Where pages are fetched from
    /// * `sink` - Where finished documents are delivered
    pub fn new(
        config: CrawlerConfig,
        source: Arc<dyn PageSource>,
        sink: Arc<dyn DocumentSink>,
    ) -> Self {
        Self {
            config,
            source,
            sink,
            store: None,
        }
    }

    /// Creates a coordinator that fetches over HTTP and posts to the configured indexer
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(CrawlerError)` - The HTTP client could not be built or the endpoint is invalid
    pub fn from_config(config: &Config) -> Result<Self, CrawlerError> {
        let client = build_http_client(&config.user_agent, &config.crawler)?;
        let source = Arc::new(HttpFetcher::new(client.clone()));
        let sink = Arc::new(HttpIndexSink::new(client, &config.indexer.endpoint)?);

        Ok(Self::new(config.crawler.clone(), source, sink))
    }

    /// Attaches a URL store that records every newly discovered URL
    pub fn with_store(mut self, store: Arc<Mutex<dyn UrlStore>>) -> Self {
        self.store = Some(store);
        self
    }

    /// Number of workers a run will use
    pub fn worker_count(&self) -> usize {
        self.config.workers
    }

    /// Runs a crawl from `seeds` until no work remains
    ///
    /// Per-URL failures do not end the run; they are collected in the returned report.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The run terminated
    /// * `Err(CrawlerError)` - No seeds, a worker count outside `1..=MAX_WORKERS`, or a
    ///   worker task panicked
    pub async fn run(&self, seeds: Vec<String>) -> Result<CrawlReport, CrawlerError> {
        if seeds.is_empty() {
            return Err(ConfigError::NoSeeds.into());
        }
        if self.config.workers == 0 || self.config.workers > MAX_WORKERS {
            return Err(ConfigError::Validation(format!(
                "workers must be between 1 and {}, got {}",
                MAX_WORKERS, self.config.workers
            ))
            .into());
        }

        let started_at = Utc::now();
        let worker_count = self.config.workers;
        tracing::info!(
            "Starting crawl with {} seeds and {} workers",
            seeds.len(),
            worker_count
        );

        let ctx = Arc::new(RunContext {
            frontier: Arc::new(Frontier::new(self.config.queue_capacity)),
            visited: VisitedSet::new(),
            errors: ErrorLog::new(),
            source: Arc::clone(&self.source),
            sink: Arc::clone(&self.sink),
            store: self.store.clone(),
            processed: AtomicU64::new(0),
        });

        let mut totals = WorkerStats::default();
        for seed in seeds {
            match ctx.frontier.admit(&seed, &ctx.visited) {
                Ok(true) => {}
                Ok(false) => tracing::debug!("Skipping duplicate seed {}", seed),
                Err(e) => {
                    tracing::warn!("{}", e);
                    totals.links_dropped += 1;
                }
            }
        }

        let handles: Vec<_> = (1..=worker_count)
            .map(|worker_id| tokio::spawn(run_worker(worker_id, Arc::clone(&ctx))))
            .collect();

        let mut join_error = None;
        for handle in handles {
            match handle.await {
                Ok(stats) => totals.merge(stats),
                Err(e) => {
                    tracing::error!("Worker task failed: {}", e);
                    join_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = join_error {
            return Err(e.into());
        }

        let report = CrawlReport {
            started_at,
            finished_at: Utc::now(),
            worker_count,
            pages_crawled: totals.pages_crawled,
            documents_emitted: totals.documents_emitted,
            links_enqueued: totals.links_enqueued,
            links_dropped: totals.links_dropped,
            visited: ctx.visited.snapshot(),
            failures: ctx.errors.drain(),
        };

        tracing::info!(
            "Crawl completed: {} pages crawled, {} documents indexed, {} failures in {:.1}s",
            report.pages_crawled,
            report.documents_emitted,
            report.failure_count(),
            report.duration().num_milliseconds() as f64 / 1000.0
        );

        Ok(report)
    }
}

/// Runs a crawl with the default HTTP fetcher and indexing sink
///
/// # Arguments
///
/// * `seeds` - The URLs to start from
/// * `worker_count` - Number of concurrent workers, at most [`MAX_WORKERS`]
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The run terminated; the report lists any per-URL failures
/// * `Err(CrawlerError)` - The run could not start
///
/// # Example
///
/// ```no_run
/// use asura_crow::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let report = run_crawl(vec!["https://example.com/".to_string()], 8).await?;
/// println!("{} pages crawled", report.pages_crawled);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    seeds: Vec<String>,
    worker_count: usize,
) -> Result<CrawlReport, CrawlerError> {
    let mut config = Config::default();
    config.crawler.workers = worker_count;

    Coordinator::from_config(&config)?.run(seeds).await
}

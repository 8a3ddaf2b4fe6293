//! Frontier for managing the crawl queue and run termination
//!
//! This module handles:
//! - The bounded FIFO queue of claimed URLs waiting for a worker
//! - Counting the URLs currently being processed
//! - Detecting quiescence (empty queue and nothing in flight) and waking every idle worker
//!
//! A worker holds a [`Lease`] for the URL it is processing. The lease is released only after
//! the worker has enqueued every link it discovered, so an empty queue with nothing in flight
//! means no further work can ever appear.

use crate::state::{RunPhase, VisitedSet};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::Notify;

/// Default upper bound on queued URLs
pub const DEFAULT_QUEUE_CAPACITY: usize = 100_000;

/// Errors returned when a URL cannot be queued
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrontierError {
    #[error("Frontier is full, dropping {0}")]
    Full(String),

    #[error("Run has terminated, rejecting {0}")]
    Closed(String),
}

#[derive(Debug)]
struct FrontierState {
    queue: VecDeque<String>,
    in_flight: usize,
    phase: RunPhase,
}

impl FrontierState {
    /// Moves to `next` if the phase table allows it
    fn advance(&mut self, next: RunPhase) -> bool {
        if !self.phase.can_transition_to(next) {
            return false;
        }
        tracing::trace!("Frontier phase {} -> {}", self.phase, next);
        self.phase = next;
        true
    }
}

/// Shared crawl queue with quiescence detection
#[derive(Debug)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    notify: Notify,
    capacity: usize,
}

impl Frontier {
    /// Creates an empty frontier holding at most `capacity` queued URLs
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(FrontierState {
                queue: VecDeque::new(),
                in_flight: 0,
                phase: RunPhase::Running,
            }),
            notify: Notify::new(),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims `url` in `visited` and queues it for processing
    ///
    /// The room check, the claim and the push happen under the frontier lock, so a URL is
    /// claimed only if it is also queued. A URL rejected as full stays unclaimed and can be
    /// admitted later.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The URL was claimed and queued
    /// * `Ok(false)` - The URL was already claimed
    /// * `Err(FrontierError::Full)` - The queue is at capacity; the URL was not claimed
    /// * `Err(FrontierError::Closed)` - The run has already terminated
    pub fn admit(&self, url: &str, visited: &VisitedSet) -> Result<bool, FrontierError> {
        let state = self.lock();

        if state.phase.is_terminal() {
            return Err(FrontierError::Closed(url.to_string()));
        }
        if visited.contains(url) {
            return Ok(false);
        }
        if state.queue.len() >= self.capacity {
            return Err(FrontierError::Full(url.to_string()));
        }
        if !visited.try_claim(url) {
            return Ok(false);
        }

        self.enqueue(state, url.to_string());
        Ok(true)
    }

    /// Pushes `url` and wakes one idle worker
    fn enqueue(&self, mut state: MutexGuard<'_, FrontierState>, url: String) {
        state.queue.push_back(url);
        // Resumes a drained run; a running one stays as it is
        state.advance(RunPhase::Running);
        drop(state);

        self.notify.notify_one();
    }

    /// Number of queued URLs
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// Number of URLs currently leased to workers
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    /// Current run phase
    pub fn phase(&self) -> RunPhase {
        self.lock().phase
    }

    /// Waits for the next URL to process
    ///
    /// # Returns
    ///
    /// * `Some(Lease)` - A URL to process; dropping the lease marks it complete
    /// * `None` - The run has terminated and the worker should exit
    pub async fn next(self: &Arc<Self>) -> Option<Lease> {
        loop {
            // Register for wakeups before inspecting the state so no notification is lost
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();

                if let Some(url) = state.queue.pop_front() {
                    state.in_flight += 1;
                    return Some(Lease {
                        frontier: Arc::clone(self),
                        url,
                    });
                }

                if state.phase.is_terminal() {
                    return None;
                }

                if state.in_flight == 0 && state.advance(RunPhase::Terminated) {
                    tracing::debug!("Frontier is quiescent, terminating run");
                    drop(state);
                    self.notify.notify_waiters();
                    return None;
                }
            }

            notified.await;
        }
    }

    fn complete(&self) {
        let mut state = self.lock();
        state.in_flight = state.in_flight.saturating_sub(1);

        if state.in_flight == 0 && state.queue.is_empty() && state.advance(RunPhase::Draining) {
            drop(state);
            self.notify.notify_waiters();
        }
    }
}

/// A URL handed to a worker
///
/// The URL counts as in flight until the lease is dropped. A worker that panics still
/// releases its lease during unwinding.
#[derive(Debug)]
pub struct Lease {
    frontier: Arc<Frontier>,
    url: String,
}

impl Lease {
    /// The URL to process
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.frontier.complete();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_new_frontier() {
        let frontier = Frontier::new(10);
        assert_eq!(frontier.pending(), 0);
        assert_eq!(frontier.in_flight(), 0);
        assert_eq!(frontier.phase(), RunPhase::Running);
    }

    #[test]
    fn test_admit_respects_capacity() {
        let frontier = Frontier::new(2);
        let visited = VisitedSet::new();
        frontier.admit("https://a.example/", &visited).unwrap();
        frontier.admit("https://b.example/", &visited).unwrap();

        assert_eq!(
            frontier.admit("https://c.example/", &visited),
            Err(FrontierError::Full("https://c.example/".to_string()))
        );
        assert_eq!(frontier.pending(), 2);
    }

    #[test]
    fn test_admit_claims_and_queues() {
        let frontier = Frontier::new(10);
        let visited = VisitedSet::new();

        assert_eq!(frontier.admit("https://a.example/", &visited), Ok(true));
        assert_eq!(frontier.admit("https://a.example/", &visited), Ok(false));
        assert!(visited.contains("https://a.example/"));
        assert_eq!(frontier.pending(), 1);
    }

    #[test]
    fn test_admit_when_full_leaves_url_unclaimed() {
        let frontier = Frontier::new(1);
        let visited = VisitedSet::new();
        assert_eq!(frontier.admit("https://a.example/", &visited), Ok(true));

        assert_eq!(
            frontier.admit("https://b.example/", &visited),
            Err(FrontierError::Full("https://b.example/".to_string()))
        );
        assert!(!visited.contains("https://b.example/"));

        // A claimed URL is a duplicate, not a drop, even when the queue is full
        assert_eq!(frontier.admit("https://a.example/", &visited), Ok(false));
    }

    #[test]
    fn test_phase_changes_follow_transition_table() {
        let mut state = FrontierState {
            queue: VecDeque::new(),
            in_flight: 0,
            phase: RunPhase::Running,
        };

        assert!(!state.advance(RunPhase::Running));
        assert!(state.advance(RunPhase::Draining));
        assert!(state.advance(RunPhase::Terminated));

        // Terminated is final
        assert!(!state.advance(RunPhase::Running));
        assert!(!state.advance(RunPhase::Draining));
        assert_eq!(state.phase, RunPhase::Terminated);
    }

    #[test]
    fn test_concurrent_admission_never_claims_without_queueing() {
        let frontier = Arc::new(Frontier::new(8));
        let visited = Arc::new(VisitedSet::new());

        let handles: Vec<_> = (0..16)
            .map(|t| {
                let frontier = Arc::clone(&frontier);
                let visited = Arc::clone(&visited);
                std::thread::spawn(move || {
                    for i in 0..200 {
                        let url = format!("https://example.com/{}/{}", t % 4, i);
                        let _ = frontier.admit(&url, &visited);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(frontier.pending(), 8);
        assert_eq!(visited.len(), frontier.pending());
    }

    #[tokio::test]
    async fn test_fifo_order_and_lease_tracking() {
        let frontier = Arc::new(Frontier::new(10));
        let visited = VisitedSet::new();
        frontier.admit("https://a.example/", &visited).unwrap();
        frontier.admit("https://b.example/", &visited).unwrap();

        let first = frontier.next().await.unwrap();
        assert_eq!(first.url(), "https://a.example/");
        assert_eq!(frontier.in_flight(), 1);

        let second = frontier.next().await.unwrap();
        assert_eq!(second.url(), "https://b.example/");
        assert_eq!(frontier.in_flight(), 2);

        drop(first);
        assert_eq!(frontier.in_flight(), 1);
        assert_eq!(frontier.phase(), RunPhase::Running);

        drop(second);
        assert_eq!(frontier.in_flight(), 0);
        assert_eq!(frontier.phase(), RunPhase::Draining);
    }

    #[tokio::test]
    async fn test_empty_frontier_terminates() {
        let frontier = Arc::new(Frontier::new(10));
        let visited = VisitedSet::new();
        assert!(frontier.next().await.is_none());
        assert_eq!(frontier.phase(), RunPhase::Terminated);

        assert_eq!(
            frontier.admit("https://late.example/", &visited),
            Err(FrontierError::Closed("https://late.example/".to_string()))
        );
        assert!(visited.is_empty());
    }

    #[tokio::test]
    async fn test_admit_while_draining_resumes() {
        let frontier = Arc::new(Frontier::new(10));
        let visited = VisitedSet::new();
        frontier.admit("https://a.example/", &visited).unwrap();
        drop(frontier.next().await.unwrap());
        assert_eq!(frontier.phase(), RunPhase::Draining);

        frontier.admit("https://b.example/", &visited).unwrap();
        assert_eq!(frontier.phase(), RunPhase::Running);
    }

    #[tokio::test]
    async fn test_idle_worker_waits_for_in_flight_work() {
        let frontier = Arc::new(Frontier::new(10));
        let visited = VisitedSet::new();
        frontier.admit("https://a.example/", &visited).unwrap();
        let lease = frontier.next().await.unwrap();

        let waiter = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move { frontier.next().await.map(|l| l.url().to_string()) })
        };

        // The waiter must not give up while a lease is outstanding
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        frontier.admit("https://b.example/", &visited).unwrap();
        drop(lease);

        let got = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got.as_deref(), Some("https://b.example/"));
    }

    #[tokio::test]
    async fn test_all_idle_workers_exit_on_quiescence() {
        let frontier = Arc::new(Frontier::new(10));
        let visited = VisitedSet::new();
        frontier.admit("https://a.example/", &visited).unwrap();
        let lease = frontier.next().await.unwrap();

        let waiters: Vec<_> = (0..8)
            .map(|_| {
                let frontier = Arc::clone(&frontier);
                tokio::spawn(async move { frontier.next().await.is_none() })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(lease);

        for waiter in waiters {
            let exited = tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .unwrap()
                .unwrap();
            assert!(exited);
        }
        assert_eq!(frontier.phase(), RunPhase::Terminated);
    }

    #[tokio::test]
    async fn test_lease_released_on_panic() {
        let frontier = Arc::new(Frontier::new(10));
        let visited = VisitedSet::new();
        frontier.admit("https://a.example/", &visited).unwrap();

        let handle = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move {
                let _lease = frontier.next().await;
                panic!("worker failed");
            })
        };

        assert!(handle.await.is_err());
        assert_eq!(frontier.in_flight(), 0);
        assert!(frontier.next().await.is_none());
    }
}

//! State module for tracking a crawl run
//!
//! # Components
//!
//! - `RunPhase`: The lifecycle of a crawl run (running, draining, terminated)
//! - `VisitedSet`: The atomic claim store that guarantees each URL is processed at most once
//! - `ErrorLog`: The per-URL failures collected by the workers of a run

mod error_log;
mod run_phase;
mod visited;

// Re-export main types
pub use error_log::ErrorLog;
pub use run_phase::RunPhase;
pub use visited::VisitedSet;

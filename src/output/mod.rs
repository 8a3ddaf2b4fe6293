//! Output module for crawl results
//!
//! This module handles:
//! - Delivering finished documents to the indexing service
//! - Recording per-URL failures
//! - Summarizing a finished crawl run

mod report;
mod sink;

pub use report::{print_report, CrawlReport, TaskError, TaskFailure};
pub use sink::{Document, DocumentSink, HttpIndexSink, SinkError, DEFAULT_INDEX_ENDPOINT};

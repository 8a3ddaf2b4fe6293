//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching of page bodies as byte streams
//! - Streaming HTML tokenization for text and link extraction
//! - The bounded frontier and its termination protocol
//! - Overall crawl coordination across the worker pool

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;

pub use coordinator::{run_crawl, Coordinator};
pub use extractor::{extract_page, extract_stream, DiscoveredLinks, ExtractError, Extraction};
pub use fetcher::{build_http_client, FetchError, HttpFetcher, PageBody, PageSource};
pub use frontier::{Frontier, FrontierError, Lease, DEFAULT_QUEUE_CAPACITY};

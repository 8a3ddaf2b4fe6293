//! Asura Crow: a concurrent web crawler
//!
//! This crate fetches pages starting from a set of seed URLs, extracts their visible text and
//! outbound links with a streaming HTML tokenizer, normalizes the text, and posts a
//! `(url, content)` document to an indexing service. Newly discovered links are claimed in a
//! shared visited set and fed back into a bounded frontier drained by a fixed worker pool.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod text;
pub mod url;

use thiserror::Error;

pub use crawler::{ExtractError, FetchError};
pub use output::SinkError;
pub use storage::StoreError;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("No seed URLs provided")]
    NoSeeds,
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_crawl, Coordinator};
pub use output::{CrawlReport, Document};
pub use state::{RunPhase, VisitedSet};
pub use text::{clean_content, extract_strings, normalize};
pub use crate::url::resolve_link;

//! Configuration module for Asura Crow
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use asura_crow::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Crawler will use {} workers", config.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, IndexerConfig, StoreConfig, UserAgentConfig, DEFAULT_WORKERS,
};

// Re-export parser functions
pub use parser::{load_config, load_config_with_hash, parse_config};

pub use validation::{validate, validate_http_url, MAX_WORKERS};

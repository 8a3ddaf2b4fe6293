//! Storage traits and error types
//!
//! This module defines the trait interface for URL store backends and
//! associated error types.

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for URL store implementations
///
/// The crawler reads its seeds from the store and records every newly discovered URL in it.
/// It owns no persistence logic itself; callers share a store behind a mutex.
pub trait UrlStore: Send {
    /// Returns the URLs a run should start from
    fn get_website_urls(&self) -> StoreResult<Vec<String>>;

    /// Records a newly discovered URL
    ///
    /// Inserting a URL that is already stored is not an error.
    fn insert_url(&mut self, url: &str) -> StoreResult<()>;
}

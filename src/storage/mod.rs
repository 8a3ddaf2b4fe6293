//! Storage module for the URL store
//!
//! This module handles persistence of known website URLs:
//! - SQLite database initialization and schema management
//! - Reading the seeds of a run
//! - Recording newly discovered URLs

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteUrlStore;
pub use traits::{StoreError, StoreResult, UrlStore};

use std::path::Path;

/// Opens or creates the URL store at `path`
pub fn open_store(path: &Path) -> StoreResult<SqliteUrlStore> {
    SqliteUrlStore::new(path)
}

/// Opens the URL store at `path`, logging a failure instead of returning it
///
/// A crawl without a store still runs from its configured seeds; it just reads no stored
/// seeds and records no discoveries.
pub fn open_store_or_log(path: &Path) -> Option<SqliteUrlStore> {
    match open_store(path) {
        Ok(store) => Some(store),
        Err(e) => {
            tracing::error!(
                "Failed to open URL store at {}, continuing without it: {}",
                path.display(),
                e
            );
            None
        }
    }
}

/// Reads the seed URLs of a run from `store`
///
/// A failing store yields no seeds; the error is logged, not returned.
pub fn seeds_from_store(store: &dyn UrlStore) -> Vec<String> {
    match store.get_website_urls() {
        Ok(urls) => {
            tracing::info!("Loaded {} seed URLs from store", urls.len());
            urls
        }
        Err(e) => {
            tracing::error!("Failed to load seed URLs from store: {}", e);
            Vec::new()
        }
    }
}

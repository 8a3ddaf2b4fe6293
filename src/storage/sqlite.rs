//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the UrlStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StoreResult, UrlStore};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite URL store
pub struct SqliteUrlStore {
    conn: Connection,
}

impl SqliteUrlStore {
    /// Opens or creates a store at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteUrlStore)` - Successfully opened/created database
    /// * `Err(StoreError)` - Failed to open database
    pub fn new(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory store
    pub fn new_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Adds a website URL, returning true if it was not stored yet
    pub fn add_website(&mut self, url: &str) -> StoreResult<bool> {
        let now = Utc::now().to_rfc3339();
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO websites (url, discovered_at) VALUES (?1, ?2)",
            params![url, now],
        )?;
        Ok(inserted > 0)
    }

    /// Number of stored URLs
    pub fn count(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM websites", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl UrlStore for SqliteUrlStore {
    fn get_website_urls(&self) -> StoreResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url FROM websites ORDER BY discovered_at, url")?;

        let urls = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(urls)
    }

    fn insert_url(&mut self, url: &str) -> StoreResult<()> {
        self.add_website(url)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_in_memory() {
        let store = SqliteUrlStore::new_in_memory().unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.get_website_urls().unwrap().is_empty());
    }

    #[test]
    fn test_insert_and_read_back() {
        let mut store = SqliteUrlStore::new_in_memory().unwrap();
        store.insert_url("https://example.com/").unwrap();
        store.insert_url("https://example.org/").unwrap();

        let mut urls = store.get_website_urls().unwrap();
        urls.sort();
        assert_eq!(urls, vec!["https://example.com/", "https://example.org/"]);
    }

    #[test]
    fn test_duplicate_insert_is_ignored() {
        let mut store = SqliteUrlStore::new_in_memory().unwrap();
        assert!(store.add_website("https://example.com/").unwrap());
        assert!(!store.add_website("https://example.com/").unwrap());
        assert!(store.insert_url("https://example.com/").is_ok());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_file_store_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("urls.db");

        {
            let mut store = SqliteUrlStore::new(&path).unwrap();
            store.insert_url("https://example.com/").unwrap();
        }

        let store = SqliteUrlStore::new(&path).unwrap();
        assert_eq!(
            store.get_website_urls().unwrap(),
            vec!["https://example.com/"]
        );
    }
}

//! Database schema definitions
//!
//! This module contains the SQL schema for the Asura Crow URL store.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Every known website URL; seeds for the next run
CREATE TABLE IF NOT EXISTS websites (
    url TEXT PRIMARY KEY,
    discovered_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_websites_discovered_at ON websites(discovered_at);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

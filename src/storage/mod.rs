//! Storage layer
//!
//! The core never opens or owns a database connection; it receives a
//! `rusqlite::Connection` from the embedding application and talks to it
//! through the schema helpers and the transaction wrapper defined here.

pub mod transaction;

pub use transaction::with_transaction;

use rusqlite::Connection;

use crate::error::BackupResult;

/// Idempotent schema for the tables the restore engine writes
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    display_name TEXT,
    phone_number TEXT,
    password_hash TEXT,
    oauth_provider TEXT,
    oauth_subject TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS favorites (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    word TEXT NOT NULL,
    entry TEXT NOT NULL,
    status TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(user_id, word)
);

CREATE INDEX IF NOT EXISTS idx_favorites_user ON favorites(user_id);

CREATE TABLE IF NOT EXISTS search_history (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    entries TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

/// Create the backup-related tables if they do not exist yet
pub fn initialize_schema(conn: &Connection) -> BackupResult<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Turn on referential-integrity enforcement for this connection
pub fn enable_foreign_keys(conn: &Connection) -> BackupResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(())
}

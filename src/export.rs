//! Snapshot export
//!
//! Reads the store into a fresh backup payload, ready to be sealed and
//! written out by the embedding application.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{BackupError, BackupResult};
use crate::models::{
    BackupPayload, FavoriteEntry, MemorizationStatus, SearchHistoryEntry, UserRecord, WordRecord,
    PAYLOAD_VERSION,
};

/// Take a snapshot of users, favorites, and search history
pub fn export_snapshot(conn: &Connection) -> BackupResult<BackupPayload> {
    let users = read_users(conn)?;

    let mut favorites = BTreeMap::new();
    for user in &users {
        favorites.insert(user.username.clone(), read_favorites(conn, &user.username)?);
    }

    Ok(BackupPayload {
        version: PAYLOAD_VERSION,
        exported_at: Utc::now().to_rfc3339(),
        users,
        favorites,
        search_history: read_search_history(conn)?,
    })
}

/// Suggested filename for a backup written at `timestamp`
///
/// Embeds the timestamp in an ISO-8601-derived form with colons replaced,
/// so the name is safe on every filesystem.
pub fn backup_filename(timestamp: DateTime<Utc>) -> String {
    format!(
        "lexivault-backup-{}.json",
        timestamp.format("%Y-%m-%dT%H-%M-%SZ")
    )
}

fn read_users(conn: &Connection) -> BackupResult<Vec<UserRecord>> {
    let mut stmt = conn.prepare(
        "SELECT username, display_name, phone_number, password_hash,
                oauth_provider, oauth_subject
         FROM users ORDER BY id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(UserRecord {
            username: row.get(0)?,
            display_name: row.get(1)?,
            phone_number: row.get(2)?,
            password_hash: row.get(3)?,
            oauth_provider: row.get(4)?,
            oauth_subject: row.get(5)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

fn read_favorites(conn: &Connection, username: &str) -> BackupResult<Vec<FavoriteEntry>> {
    let mut stmt = conn.prepare(
        "SELECT f.entry, f.status, f.updated_at
         FROM favorites f
         JOIN users u ON u.id = f.user_id
         WHERE u.username = ?1
         ORDER BY f.id",
    )?;
    let rows = stmt.query_map(params![username], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut entries = Vec::new();
    for row in rows {
        let (record, status, updated_at) = row?;
        let word: WordRecord = serde_json::from_str(&record).map_err(|e| {
            BackupError::DbError(format!("stored word record is corrupted: {e}"))
        })?;
        let status = MemorizationStatus::parse(&status).ok_or_else(|| {
            BackupError::DbError(format!("stored favorite has unknown status '{status}'"))
        })?;
        entries.push(FavoriteEntry {
            word,
            status,
            updated_at,
        });
    }
    Ok(entries)
}

fn read_search_history(conn: &Connection) -> BackupResult<Vec<SearchHistoryEntry>> {
    let stored: Option<String> = conn
        .query_row("SELECT entries FROM search_history WHERE id = 1", [], |row| {
            row.get(0)
        })
        .optional()?;

    match stored {
        None => Ok(Vec::new()),
        Some(entries) => serde_json::from_str(&entries).map_err(|e| {
            BackupError::DbError(format!("stored search history is corrupted: {e}"))
        }),
    }
}

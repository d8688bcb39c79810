//! Atomic restore engine
//!
//! Applies a backup payload to the store inside exactly one transaction.
//! Validation happens first and never touches the database; once the
//! transaction is open, every user upsert, favorite replacement, and the
//! search-history upsert either all commit together or none persist.
//! Users not named in the payload are left untouched.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use crate::error::{BackupError, BackupResult};
use crate::models::{
    BackupPayload, FavoriteEntry, RestoreOutcome, RestoredCounts, SearchHistoryEntry, UserRecord,
};
use crate::storage::{enable_foreign_keys, with_transaction};
use crate::validate::{validate_with_limits, Limits};

/// Restore a decoded backup payload with the default [`Limits`]
pub fn restore(conn: &Connection, raw: &Value) -> RestoreOutcome {
    restore_with_limits(conn, raw, &Limits::default())
}

/// Restore a decoded backup payload against explicit size bounds
pub fn restore_with_limits(conn: &Connection, raw: &Value, limits: &Limits) -> RestoreOutcome {
    let payload = match validate_with_limits(raw, limits) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::warn!(code = err.code().as_str(), %err, "backup payload rejected");
            let mut details = serde_json::Map::new();
            details.insert("underlying".into(), Value::String(err.to_string()));
            if let Some(version) = raw.get("version") {
                details.insert("payloadVersion".into(), version.clone());
            }
            return RestoreOutcome::failure(&err, details);
        }
    };
    restore_payload(conn, &payload, limits)
}

/// Restore an already-validated payload
pub fn restore_payload(
    conn: &Connection,
    payload: &BackupPayload,
    limits: &Limits,
) -> RestoreOutcome {
    let attempted = RestoredCounts {
        users: payload.users.len(),
        favorites: payload.favorite_count(),
        search_history: payload.search_history.len().min(limits.max_search_history),
    };

    let result = enable_foreign_keys(conn)
        .and_then(|()| with_transaction(conn, |tx| apply_payload(tx, payload, limits)));

    match result {
        Ok(restored) => {
            tracing::info!(
                users = restored.users,
                favorites = restored.favorites,
                search_history = restored.search_history,
                "backup restored"
            );
            RestoreOutcome::success(restored)
        }
        Err(err) => {
            tracing::error!(
                code = err.code().as_str(),
                attempted_users = attempted.users,
                attempted_favorites = attempted.favorites,
                attempted_search_history = attempted.search_history,
                payload_version = payload.version,
                %err,
                "restore failed, rolled back"
            );
            let mut details = serde_json::Map::new();
            details.insert(
                "attempted".into(),
                serde_json::to_value(attempted).unwrap_or(Value::Null),
            );
            details.insert("payloadVersion".into(), payload.version.into());
            details.insert("underlying".into(), Value::String(err.to_string()));
            if let BackupError::RollbackFailed { source, rollback } = &err {
                details.insert("cause".into(), Value::String(source.to_string()));
                details.insert("rollbackError".into(), Value::String(rollback.clone()));
            }
            RestoreOutcome::failure(&err, details)
        }
    }
}

fn apply_payload(
    conn: &Connection,
    payload: &BackupPayload,
    limits: &Limits,
) -> BackupResult<RestoredCounts> {
    let now = Utc::now().to_rfc3339();
    let mut counts = RestoredCounts::default();

    for user in &payload.users {
        let user_id = upsert_user(conn, user, &now)?;
        counts.favorites +=
            replace_favorites(conn, user_id, payload.favorites_for(&user.username))?;
        counts.users += 1;
    }

    counts.search_history = replace_search_history(
        conn,
        &payload.search_history,
        limits.max_search_history,
        &now,
    )?;

    Ok(counts)
}

/// Insert or update one user, returning its row id
fn upsert_user(conn: &Connection, user: &UserRecord, now: &str) -> BackupResult<i64> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM users WHERE username = ?1",
            params![user.username],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        Some(id) => {
            conn.execute(
                "UPDATE users SET display_name = ?1, phone_number = ?2, password_hash = ?3,
                        oauth_provider = ?4, oauth_subject = ?5, updated_at = ?6
                 WHERE id = ?7",
                params![
                    user.display_name,
                    user.phone_number,
                    user.password_hash,
                    user.oauth_provider,
                    user.oauth_subject,
                    now,
                    id
                ],
            )?;
            Ok(id)
        }
        None => {
            conn.execute(
                "INSERT INTO users (username, display_name, phone_number, password_hash,
                                    oauth_provider, oauth_subject, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    user.username,
                    user.display_name,
                    user.phone_number,
                    user.password_hash,
                    user.oauth_provider,
                    user.oauth_subject,
                    now
                ],
            )?;
            // Re-read rather than trusting last_insert_rowid across the
            // borrowed handle; a missing id here aborts the transaction.
            conn.query_row(
                "SELECT id FROM users WHERE username = ?1",
                params![user.username],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| {
                BackupError::DbError(format!(
                    "user '{}' has no id after insert",
                    user.username
                ))
            })
        }
    }
}

/// Delete all of a user's favorites and insert the payload's list
///
/// Full replace, never merge: re-importing the same backup is idempotent.
fn replace_favorites(
    conn: &Connection,
    user_id: i64,
    entries: &[FavoriteEntry],
) -> BackupResult<usize> {
    conn.execute("DELETE FROM favorites WHERE user_id = ?1", params![user_id])?;

    for entry in entries {
        let record = serde_json::to_string(&entry.word)
            .map_err(|e| BackupError::Unknown(format!("failed to serialize word record: {e}")))?;
        conn.execute(
            "INSERT INTO favorites (user_id, word, entry, status, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user_id,
                entry.word.word,
                record,
                entry.status.as_str(),
                entry.updated_at
            ],
        )?;
    }

    Ok(entries.len())
}

/// Replace the single search-history row with the incoming history
fn replace_search_history(
    conn: &Connection,
    history: &[SearchHistoryEntry],
    cap: usize,
    now: &str,
) -> BackupResult<usize> {
    let capped = &history[..history.len().min(cap)];
    let entries = serde_json::to_string(capped)
        .map_err(|e| BackupError::Unknown(format!("failed to serialize search history: {e}")))?;

    conn.execute(
        "INSERT INTO search_history (id, entries, updated_at) VALUES (1, ?1, ?2)
         ON CONFLICT(id) DO UPDATE SET entries = excluded.entries,
                                       updated_at = excluded.updated_at",
        params![entries, now],
    )?;

    Ok(capped.len())
}

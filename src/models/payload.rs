//! Backup payload envelope
//!
//! The logical snapshot of everything the app persists locally: user
//! accounts, each user's saved words, and the search history. Payloads are
//! transient; they exist only while exporting or importing and are never
//! stored themselves.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::favorite::FavoriteEntry;
use super::search::SearchHistoryEntry;
use super::user::UserRecord;

/// The payload schema version this build reads and writes
pub const PAYLOAD_VERSION: u32 = 1;

/// A complete backup snapshot
///
/// Instances only ever come out of the payload validator or
/// `export_snapshot`, so holding a `BackupPayload` means the invariants
/// (normalized unique usernames, favorites keyed by declared users, bounded
/// sizes) already hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupPayload {
    /// Schema version, always [`PAYLOAD_VERSION`]
    pub version: u32,
    /// When the snapshot was taken (RFC 3339)
    pub exported_at: String,
    /// All user accounts, in export order
    pub users: Vec<UserRecord>,
    /// Saved words per normalized username; every declared user has a key
    pub favorites: BTreeMap<String, Vec<FavoriteEntry>>,
    /// Recent dictionary lookups, newest first
    pub search_history: Vec<SearchHistoryEntry>,
}

impl BackupPayload {
    /// Total favorites across all users
    pub fn favorite_count(&self) -> usize {
        self.favorites.values().map(Vec::len).sum()
    }

    /// Favorites for one user, empty if none were declared
    pub fn favorites_for(&self, username: &str) -> &[FavoriteEntry] {
        self.favorites.get(username).map(Vec::as_slice).unwrap_or(&[])
    }
}

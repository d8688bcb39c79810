//! Core data models for lexivault
//!
//! This module contains the data structures that make up a backup: user
//! records, saved words with their memorization status, search history,
//! and the payload envelope that ties them together, plus the outcome
//! value returned by a restore.

pub mod favorite;
pub mod outcome;
pub mod payload;
pub mod search;
pub mod user;

pub use favorite::{FavoriteEntry, MemorizationStatus, WordRecord};
pub use outcome::{RestoreOutcome, RestoredCounts};
pub use payload::{BackupPayload, PAYLOAD_VERSION};
pub use search::{SearchHistoryEntry, SEARCH_MODE};
pub use user::{normalize_username, UserRecord};

//! lexivault - encrypted backup and atomic restore for vocabulary data
//!
//! This library preserves and restores a user's local vocabulary-learning
//! data (accounts, saved words, search history) across devices and
//! reinstalls via an encrypted backup file. It is the core invoked by an
//! embedding application's export/import screens; file pickers, sharing,
//! and the store's open/close lifecycle stay outside.
//!
//! # Architecture
//!
//! - `error`: error taxonomy shared by every component
//! - `models`: payload data model and the restore outcome value
//! - `validate`: strict validation of untrusted backup content
//! - `crypto`: PBKDF2 key derivation
//! - `codec`: versioned sealed-container encryption/authentication
//! - `storage`: schema helpers and the transaction wrapper
//! - `restore`: the all-or-nothing restore transaction
//! - `export`: store snapshot into a fresh payload
//!
//! # Example
//!
//! ```rust,ignore
//! use lexivault::{export_snapshot, restore, seal, unseal};
//!
//! let snapshot = export_snapshot(&conn)?;
//! let container = seal(&snapshot, passphrase)?;
//! // ... write container.to_json()? somewhere, later read it back ...
//! let payload = unseal(&text, passphrase)?;
//! let outcome = restore_payload(&conn, &payload, &Limits::default());
//! ```
//!
//! Sealing, unsealing, and restoring are blocking calls (PBKDF2 key
//! derivation is CPU-bound, SQLite I/O is synchronous); run them off any
//! latency-sensitive executor.

pub mod codec;
pub mod crypto;
pub mod error;
pub mod export;
pub mod models;
pub mod restore;
pub mod storage;
pub mod validate;

pub use codec::{seal, unseal, SealedContainer};
pub use error::{BackupError, BackupResult, ErrorCode};
pub use export::{backup_filename, export_snapshot};
pub use models::{
    BackupPayload, FavoriteEntry, MemorizationStatus, RestoreOutcome, RestoredCounts,
    SearchHistoryEntry, UserRecord, WordRecord,
};
pub use restore::{restore, restore_payload, restore_with_limits};
pub use storage::{initialize_schema, with_transaction};
pub use validate::{validate, validate_with_limits, Limits};

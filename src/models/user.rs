//! User record model
//!
//! A user account as carried inside a backup payload. Usernames are the
//! stable key across devices: they are stored normalized (trimmed and
//! lower-cased) and must be unique within a payload.

use serde::{Deserialize, Serialize};

/// Normalize a username for use as a lookup key
///
/// Trims surrounding whitespace and lower-cases the remainder. Every
/// username in a validated payload has already been through this.
pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// A user account carried in a backup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Normalized username, the unique key for this account
    pub username: String,
    /// Optional display name shown in the UI
    #[serde(default)]
    pub display_name: Option<String>,
    /// Optional phone number
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Password hash for local login (opaque to this subsystem)
    #[serde(default)]
    pub password_hash: Option<String>,
    /// OAuth provider name, if the account is federated
    #[serde(default)]
    pub oauth_provider: Option<String>,
    /// OAuth subject identifier, if the account is federated
    #[serde(default)]
    pub oauth_subject: Option<String>,
}

impl UserRecord {
    /// Create a record with just a username, normalizing it
    pub fn new(username: &str) -> Self {
        Self {
            username: normalize_username(username),
            display_name: None,
            phone_number: None,
            password_hash: None,
            oauth_provider: None,
            oauth_subject: None,
        }
    }
}

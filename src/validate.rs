//! Payload validator
//!
//! Turns an arbitrary decoded JSON value into a typed [`BackupPayload`] or
//! a structured error. Validation is total: the value is either fully
//! well-typed (with usernames normalized and per-user favorite lists
//! materialized) or rejected outright, and nothing here ever touches
//! storage. The first structural violation short-circuits the whole run.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{BackupError, BackupResult};
use crate::models::{
    normalize_username, BackupPayload, FavoriteEntry, MemorizationStatus, SearchHistoryEntry,
    UserRecord, WordRecord, PAYLOAD_VERSION, SEARCH_MODE,
};

/// Size bounds applied to untrusted payloads
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Maximum number of user records
    pub max_users: usize,
    /// Maximum total favorites across all users
    pub max_favorites: usize,
    /// Maximum search-history entries
    pub max_search_history: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_users: 5_000,
            max_favorites: 50_000,
            max_search_history: 200,
        }
    }
}

/// Validate a decoded backup payload with the default [`Limits`]
pub fn validate(raw: &Value) -> BackupResult<BackupPayload> {
    validate_with_limits(raw, &Limits::default())
}

/// Validate a decoded backup payload against explicit size bounds
pub fn validate_with_limits(raw: &Value, limits: &Limits) -> BackupResult<BackupPayload> {
    let root = raw
        .as_object()
        .ok_or_else(|| BackupError::InvalidPayload("payload must be a JSON object".into()))?;

    let version = parse_version(root.get("version"))?;
    let exported_at = require_nonempty_string(root.get("exportedAt"), "exportedAt")?;

    let users = validate_users(root.get("users"), limits)?;
    let usernames: HashSet<&str> = users.iter().map(|u| u.username.as_str()).collect();

    let mut favorites = validate_favorites(root.get("favorites"), &usernames, limits)?;
    // Users with no declared favorites get an implicit empty list.
    for user in &users {
        favorites.entry(user.username.clone()).or_default();
    }

    let search_history = validate_search_history(root.get("searchHistory"), limits)?;

    Ok(BackupPayload {
        version,
        exported_at,
        users,
        favorites,
        search_history,
    })
}

/// `version` must parse as the integer 1 (number or numeric string)
fn parse_version(value: Option<&Value>) -> BackupResult<u32> {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v == i64::from(PAYLOAD_VERSION) => Ok(PAYLOAD_VERSION),
        Some(v) => Err(BackupError::UnsupportedVersion(format!(
            "payload version {v} is not supported"
        ))),
        None => Err(BackupError::UnsupportedVersion(
            "payload version is missing or not an integer".into(),
        )),
    }
}

fn validate_users(value: Option<&Value>, limits: &Limits) -> BackupResult<Vec<UserRecord>> {
    let items = value
        .and_then(Value::as_array)
        .ok_or_else(|| BackupError::InvalidPayload("users must be an array".into()))?;

    if items.len() > limits.max_users {
        return Err(BackupError::InvalidPayload(format!(
            "too many users: {} exceeds the limit of {}",
            items.len(),
            limits.max_users
        )));
    }

    let mut users = Vec::with_capacity(items.len());
    let mut seen: HashSet<String> = HashSet::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let obj = item.as_object().ok_or_else(|| {
            BackupError::InvalidPayload(format!("users[{index}] must be an object"))
        })?;

        let raw_name = obj.get("username").and_then(Value::as_str).unwrap_or("");
        let username = normalize_username(raw_name);
        if username.is_empty() {
            return Err(BackupError::InvalidPayload(format!(
                "users[{index}] is missing a username"
            )));
        }
        if !seen.insert(username.clone()) {
            return Err(BackupError::InvalidPayload(format!(
                "duplicate username '{username}'"
            )));
        }

        users.push(UserRecord {
            username,
            display_name: optional_string(obj.get("displayName"), index, "displayName")?,
            phone_number: optional_string(obj.get("phoneNumber"), index, "phoneNumber")?,
            password_hash: optional_string(obj.get("passwordHash"), index, "passwordHash")?,
            oauth_provider: optional_string(obj.get("oauthProvider"), index, "oauthProvider")?,
            oauth_subject: optional_string(obj.get("oauthSubject"), index, "oauthSubject")?,
        });
    }

    Ok(users)
}

fn validate_favorites(
    value: Option<&Value>,
    usernames: &HashSet<&str>,
    limits: &Limits,
) -> BackupResult<BTreeMap<String, Vec<FavoriteEntry>>> {
    let map = match value {
        None | Some(Value::Null) => return Ok(BTreeMap::new()),
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(BackupError::InvalidPayload(
                "favorites must be an object keyed by username".into(),
            ))
        }
    };

    let mut favorites = BTreeMap::new();
    let mut total = 0usize;

    for (key, entries_value) in map {
        let username = normalize_username(key);
        if !usernames.contains(username.as_str()) {
            return Err(BackupError::InvalidPayload(format!(
                "favorites references unknown user '{username}'"
            )));
        }
        // Two raw keys must not collapse onto one user after normalization;
        // overwriting the earlier list would drop entries silently.
        if favorites.contains_key(&username) {
            return Err(BackupError::InvalidPayload(format!(
                "duplicate favorites key for user '{username}'"
            )));
        }

        let items = entries_value.as_array().ok_or_else(|| {
            BackupError::InvalidPayload(format!("favorites for '{username}' must be an array"))
        })?;

        total += items.len();
        if total > limits.max_favorites {
            return Err(BackupError::InvalidPayload(format!(
                "too many favorites: more than the limit of {}",
                limits.max_favorites
            )));
        }

        let mut entries = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            entries.push(validate_favorite_entry(item, &username, index)?);
        }
        favorites.insert(username, entries);
    }

    Ok(favorites)
}

fn validate_favorite_entry(
    item: &Value,
    username: &str,
    index: usize,
) -> BackupResult<FavoriteEntry> {
    let obj = item.as_object().ok_or_else(|| {
        BackupError::InvalidPayload(format!(
            "favorites for '{username}'[{index}] must be an object"
        ))
    })?;

    let word_value = obj.get("word").and_then(Value::as_object).ok_or_else(|| {
        BackupError::InvalidPayload(format!(
            "favorites for '{username}'[{index}] is missing a word record"
        ))
    })?;
    let headword = word_value.get("word").and_then(Value::as_str).unwrap_or("");
    if headword.is_empty() {
        return Err(BackupError::InvalidPayload(format!(
            "favorites for '{username}'[{index}] has an empty word"
        )));
    }
    let mut extra = word_value.clone();
    extra.remove("word");
    let word = WordRecord {
        word: headword.to_string(),
        extra,
    };

    let status_str = obj.get("status").and_then(Value::as_str).unwrap_or("");
    let status = MemorizationStatus::parse(status_str).ok_or_else(|| {
        BackupError::InvalidPayload(format!(
            "favorites for '{username}'[{index}] has unknown status '{status_str}'"
        ))
    })?;

    // A missing or malformed timestamp is not worth losing the word over;
    // anything that is not valid RFC 3339 defaults to the current time.
    let updated_at = match obj.get("updatedAt").and_then(Value::as_str) {
        Some(s) if DateTime::parse_from_rfc3339(s).is_ok() => s.to_string(),
        _ => Utc::now().to_rfc3339(),
    };

    Ok(FavoriteEntry {
        word,
        status,
        updated_at,
    })
}

fn validate_search_history(
    value: Option<&Value>,
    limits: &Limits,
) -> BackupResult<Vec<SearchHistoryEntry>> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(BackupError::InvalidPayload(
                "searchHistory must be an array".into(),
            ))
        }
    };

    if items.len() > limits.max_search_history {
        return Err(BackupError::InvalidPayload(format!(
            "too many search-history entries: {} exceeds the limit of {}",
            items.len(),
            limits.max_search_history
        )));
    }

    let mut history = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let obj = item.as_object().ok_or_else(|| {
            BackupError::InvalidPayload(format!("searchHistory[{index}] must be an object"))
        })?;

        let term =
            require_nonempty_string(obj.get("term"), &format!("searchHistory[{index}].term"))?;
        let mode = obj.get("mode").and_then(Value::as_str).unwrap_or("");
        if mode != SEARCH_MODE {
            return Err(BackupError::InvalidPayload(format!(
                "searchHistory[{index}] has unsupported mode '{mode}'"
            )));
        }
        let searched_at = require_nonempty_string(
            obj.get("searchedAt"),
            &format!("searchHistory[{index}].searchedAt"),
        )?;

        history.push(SearchHistoryEntry {
            term,
            mode: SEARCH_MODE.to_string(),
            searched_at,
        });
    }

    Ok(history)
}

fn optional_string(
    value: Option<&Value>,
    index: usize,
    field: &str,
) -> BackupResult<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(BackupError::InvalidPayload(format!(
            "users[{index}].{field} must be a string or null"
        ))),
    }
}

fn require_nonempty_string(value: Option<&Value>, field: &str) -> BackupResult<String> {
    match value.and_then(Value::as_str) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(BackupError::InvalidPayload(format!(
            "{field} must be a non-empty string"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;

    fn minimal_payload() -> Value {
        json!({
            "version": 1,
            "exportedAt": "2026-01-02T00:00:00Z",
            "users": [{"username": "alice"}],
            "favorites": {},
            "searchHistory": []
        })
    }

    #[test]
    fn test_minimal_payload_validates() {
        let payload = validate(&minimal_payload()).unwrap();
        assert_eq!(payload.version, 1);
        assert_eq!(payload.users.len(), 1);
        // Implicit empty favorites list for the declared user.
        assert!(payload.favorites.contains_key("alice"));
    }

    #[test]
    fn test_version_as_numeric_string() {
        let mut raw = minimal_payload();
        raw["version"] = json!("1");
        assert!(validate(&raw).is_ok());
    }

    #[test]
    fn test_wrong_version_rejected() {
        let mut raw = minimal_payload();
        raw["version"] = json!(2);
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedVersion);
    }

    #[test]
    fn test_missing_version_rejected() {
        let raw = json!({"exportedAt": "x", "users": []});
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedVersion);
    }

    #[test]
    fn test_empty_exported_at_rejected() {
        let mut raw = minimal_payload();
        raw["exportedAt"] = json!("");
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidPayload);
    }

    #[test]
    fn test_missing_users_rejected() {
        let raw = json!({"version": 1, "exportedAt": "2026-01-02T00:00:00Z"});
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidPayload);
    }

    #[test]
    fn test_usernames_normalized_and_deduplicated() {
        let mut raw = minimal_payload();
        raw["users"] = json!([{"username": " Alice "}, {"username": "ALICE"}]);
        let err = validate(&raw).unwrap_err();
        assert!(err.to_string().contains("duplicate username 'alice'"));
    }

    #[test]
    fn test_user_fields_must_be_string_or_null() {
        let mut raw = minimal_payload();
        raw["users"] = json!([{"username": "alice", "displayName": 42}]);
        assert_eq!(
            validate(&raw).unwrap_err().code(),
            ErrorCode::InvalidPayload
        );
    }

    #[test]
    fn test_favorites_for_unknown_user_rejected() {
        let mut raw = minimal_payload();
        raw["favorites"] = json!({"bob": []});
        let err = validate(&raw).unwrap_err();
        assert!(err.to_string().contains("unknown user 'bob'"));
    }

    #[test]
    fn test_favorites_key_normalized_before_matching() {
        let mut raw = minimal_payload();
        raw["favorites"] = json!({" ALICE ": [{
            "word": {"word": "hello"},
            "status": "review",
            "updatedAt": "2026-01-01T00:00:00Z"
        }]});
        let payload = validate(&raw).unwrap();
        assert_eq!(payload.favorites_for("alice").len(), 1);
    }

    #[test]
    fn test_favorites_keys_colliding_after_normalization_rejected() {
        let mut raw = minimal_payload();
        raw["favorites"] = json!({
            "Alice": [{"word": {"word": "one"}, "status": "review", "updatedAt": "t"}],
            "alice": [{"word": {"word": "two"}, "status": "review", "updatedAt": "t"}]
        });
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidPayload);
        assert!(err.to_string().contains("duplicate favorites key for user 'alice'"));
    }

    #[test]
    fn test_favorite_missing_word_rejected() {
        let mut raw = minimal_payload();
        raw["favorites"] = json!({"alice": [{"status": "review"}]});
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidPayload);
    }

    #[test]
    fn test_favorite_empty_headword_rejected() {
        let mut raw = minimal_payload();
        raw["favorites"] = json!({"alice": [{
            "word": {"word": ""},
            "status": "review"
        }]});
        assert_eq!(
            validate(&raw).unwrap_err().code(),
            ErrorCode::InvalidPayload
        );
    }

    #[test]
    fn test_favorite_unknown_status_rejected() {
        let mut raw = minimal_payload();
        raw["favorites"] = json!({"alice": [{
            "word": {"word": "hello"},
            "status": "learned"
        }]});
        let err = validate(&raw).unwrap_err();
        assert!(err.to_string().contains("unknown status 'learned'"));
    }

    #[test]
    fn test_favorite_missing_updated_at_defaults_to_now() {
        let mut raw = minimal_payload();
        raw["favorites"] = json!({"alice": [{
            "word": {"word": "hello"},
            "status": "toMemorize"
        }]});
        let payload = validate(&raw).unwrap();
        assert!(!payload.favorites_for("alice")[0].updated_at.is_empty());
    }

    #[test]
    fn test_favorite_unparsable_updated_at_defaults_to_now() {
        let mut raw = minimal_payload();
        raw["favorites"] = json!({"alice": [{
            "word": {"word": "hello"},
            "status": "toMemorize",
            "updatedAt": "not-a-date"
        }]});
        let payload = validate(&raw).unwrap();
        let stored = &payload.favorites_for("alice")[0].updated_at;
        assert_ne!(stored, "not-a-date");
        assert!(DateTime::parse_from_rfc3339(stored).is_ok());
    }

    #[test]
    fn test_favorite_valid_updated_at_kept_verbatim() {
        let mut raw = minimal_payload();
        raw["favorites"] = json!({"alice": [{
            "word": {"word": "hello"},
            "status": "toMemorize",
            "updatedAt": "2026-01-01T00:00:00Z"
        }]});
        let payload = validate(&raw).unwrap();
        assert_eq!(
            payload.favorites_for("alice")[0].updated_at,
            "2026-01-01T00:00:00Z"
        );
    }

    #[test]
    fn test_favorite_word_extras_preserved() {
        let mut raw = minimal_payload();
        raw["favorites"] = json!({"alice": [{
            "word": {"word": "hello", "phonetic": "/həˈloʊ/"},
            "status": "mastered",
            "updatedAt": "2026-01-01T00:00:00Z"
        }]});
        let payload = validate(&raw).unwrap();
        let entry = &payload.favorites_for("alice")[0];
        assert_eq!(entry.word.word, "hello");
        assert_eq!(entry.word.extra["phonetic"], "/həˈloʊ/");
    }

    #[test]
    fn test_search_history_wrong_mode_rejected() {
        let mut raw = minimal_payload();
        raw["searchHistory"] = json!([{
            "term": "hello",
            "mode": "en-fr",
            "searchedAt": "2026-01-01T00:00:00Z"
        }]);
        let err = validate(&raw).unwrap_err();
        assert!(err.to_string().contains("unsupported mode 'en-fr'"));
    }

    #[test]
    fn test_search_history_empty_term_rejected() {
        let mut raw = minimal_payload();
        raw["searchHistory"] = json!([{
            "term": "",
            "mode": "en-en",
            "searchedAt": "2026-01-01T00:00:00Z"
        }]);
        assert_eq!(
            validate(&raw).unwrap_err().code(),
            ErrorCode::InvalidPayload
        );
    }

    #[test]
    fn test_missing_optional_sections_default_to_empty() {
        let raw = json!({
            "version": 1,
            "exportedAt": "2026-01-02T00:00:00Z",
            "users": []
        });
        let payload = validate(&raw).unwrap();
        assert!(payload.favorites.is_empty());
        assert!(payload.search_history.is_empty());
    }

    #[test]
    fn test_user_limit_enforced() {
        let limits = Limits {
            max_users: 1,
            ..Limits::default()
        };
        let mut raw = minimal_payload();
        raw["users"] = json!([{"username": "alice"}, {"username": "bob"}]);
        let err = validate_with_limits(&raw, &limits).unwrap_err();
        assert!(err.to_string().contains("too many users"));
    }

    #[test]
    fn test_favorite_total_limit_enforced() {
        let limits = Limits {
            max_favorites: 1,
            ..Limits::default()
        };
        let mut raw = minimal_payload();
        raw["favorites"] = json!({"alice": [
            {"word": {"word": "one"}, "status": "review"},
            {"word": {"word": "two"}, "status": "review"}
        ]});
        let err = validate_with_limits(&raw, &limits).unwrap_err();
        assert!(err.to_string().contains("too many favorites"));
    }

    #[test]
    fn test_search_history_limit_enforced() {
        let limits = Limits {
            max_search_history: 1,
            ..Limits::default()
        };
        let mut raw = minimal_payload();
        raw["searchHistory"] = json!([
            {"term": "a", "mode": "en-en", "searchedAt": "t"},
            {"term": "b", "mode": "en-en", "searchedAt": "t"}
        ]);
        let err = validate_with_limits(&raw, &limits).unwrap_err();
        assert!(err.to_string().contains("too many search-history entries"));
    }

    #[test]
    fn test_non_object_payload_rejected() {
        assert_eq!(
            validate(&json!([1, 2, 3])).unwrap_err().code(),
            ErrorCode::InvalidPayload
        );
    }
}

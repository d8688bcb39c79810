//! Search history model

use serde::{Deserialize, Serialize};

/// The only dictionary mode this build records history for
pub const SEARCH_MODE: &str = "en-en";

/// A single dictionary lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryEntry {
    /// The term that was searched
    pub term: String,
    /// Dictionary mode, always `en-en`
    pub mode: String,
    /// When the search happened
    pub searched_at: String,
}

impl SearchHistoryEntry {
    /// Create an entry in the default mode
    pub fn new(term: &str, searched_at: &str) -> Self {
        Self {
            term: term.to_string(),
            mode: SEARCH_MODE.to_string(),
            searched_at: searched_at.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_default_mode() {
        let entry = SearchHistoryEntry::new("hello", "2026-01-01T00:00:00Z");
        assert_eq!(entry.mode, SEARCH_MODE);
        assert_eq!(entry.term, "hello");
    }

    #[test]
    fn test_serde_camel_case() {
        let entry = SearchHistoryEntry::new("hello", "2026-01-01T00:00:00Z");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["searchedAt"], "2026-01-01T00:00:00Z");
    }
}

//! Favorite word model
//!
//! A favorite is a saved dictionary word plus the user's memorization
//! progress. The dictionary record itself is carried verbatim: only the
//! headword is typed, everything else the dictionary attached (senses,
//! phonetics, etc.) is preserved through a flattened map so a sealed
//! payload round-trips without loss.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Learning stage of a saved word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MemorizationStatus {
    /// Not yet studied
    ToMemorize,
    /// Seen at least once, due for review
    Review,
    /// Considered learned
    Mastered,
}

impl MemorizationStatus {
    /// Parse a status from its wire spelling
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "toMemorize" => Some(Self::ToMemorize),
            "review" => Some(Self::Review),
            "mastered" => Some(Self::Mastered),
            _ => None,
        }
    }

    /// The wire spelling of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToMemorize => "toMemorize",
            Self::Review => "review",
            Self::Mastered => "mastered",
        }
    }
}

impl Default for MemorizationStatus {
    fn default() -> Self {
        Self::ToMemorize
    }
}

impl fmt::Display for MemorizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dictionary record for a single word
///
/// The headword is required and non-empty; all other fields the dictionary
/// attached are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordRecord {
    /// The headword itself
    pub word: String,
    /// Everything else the dictionary record carried
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl WordRecord {
    /// Create a bare record holding only the headword
    pub fn new(word: &str) -> Self {
        Self {
            word: word.to_string(),
            extra: serde_json::Map::new(),
        }
    }
}

/// A saved word plus its learning state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    /// The full dictionary record for the saved word
    pub word: WordRecord,
    /// Current memorization stage
    pub status: MemorizationStatus,
    /// When this favorite was last touched
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(
            MemorizationStatus::parse("toMemorize"),
            Some(MemorizationStatus::ToMemorize)
        );
        assert_eq!(
            MemorizationStatus::parse("mastered"),
            Some(MemorizationStatus::Mastered)
        );
        assert_eq!(MemorizationStatus::parse("learned"), None);
        assert_eq!(MemorizationStatus::parse(""), None);
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            MemorizationStatus::ToMemorize,
            MemorizationStatus::Review,
            MemorizationStatus::Mastered,
        ] {
            assert_eq!(MemorizationStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_status_serde_spelling() {
        let json = serde_json::to_string(&MemorizationStatus::ToMemorize).unwrap();
        assert_eq!(json, "\"toMemorize\"");
    }

    #[test]
    fn test_word_record_preserves_extra_fields() {
        let raw = serde_json::json!({
            "word": "hello",
            "phonetic": "/həˈloʊ/",
            "senses": ["greeting"]
        });
        let record: WordRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(record.word, "hello");
        assert_eq!(serde_json::to_value(&record).unwrap(), raw);
    }

    #[test]
    fn test_favorite_entry_serde() {
        let entry = FavoriteEntry {
            word: WordRecord::new("ubiquitous"),
            status: MemorizationStatus::Review,
            updated_at: "2026-01-01T00:00:00Z".into(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["word"]["word"], "ubiquitous");
        assert_eq!(json["status"], "review");
        assert_eq!(json["updatedAt"], "2026-01-01T00:00:00Z");
    }
}

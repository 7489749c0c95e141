use crate::i18n::Locale;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type PostId = i64;

/// A title/content pair in one locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub title: String,
    pub content: String,
}

impl LocalizedText {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Denormalized locale → {title, content} mapping stored on a post.
///
/// Keys are the closed `Locale` set, iterated in enumeration order.
/// Serializes as `{"en": {...}, "hi": {...}, "gu": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationSnapshot(BTreeMap<Locale, LocalizedText>);

impl TranslationSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, locale: Locale, text: LocalizedText) {
        self.0.insert(locale, text);
    }

    pub fn get(&self, locale: Locale) -> Option<&LocalizedText> {
        self.0.get(&locale)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A blog post with its canonical (English) content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    /// `None` until the first fan-out has completed
    pub translations: Option<TranslationSnapshot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Canonical fields, authoritative for the canonical locale.
    pub fn canonical(&self) -> LocalizedText {
        LocalizedText::new(self.title.clone(), self.content.clone())
    }
}

/// A materialized translation of one post into one locale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostTranslation {
    pub id: i64,
    pub post_id: PostId,
    pub locale: Locale,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Read-side rendering of a post in one locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslatedPost {
    pub title: String,
    pub content: String,
    pub locale: Locale,
}

impl From<PostTranslation> for TranslatedPost {
    fn from(row: PostTranslation) -> Self {
        Self {
            title: row.title,
            content: row.content,
            locale: row.locale,
        }
    }
}

/// Fields for a new post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
}

/// Partial update of a post's canonical fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl PostChanges {
    /// True when neither field was provided (no re-translation needed).
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_serializes_keyed_by_code() {
        let mut snapshot = TranslationSnapshot::new();
        snapshot.insert(Locale::Hi, LocalizedText::new("नमस्ते", "दुनिया"));
        snapshot.insert(Locale::En, LocalizedText::new("Hi", "World"));

        let json = serde_json::to_value(&snapshot).expect("serialize");
        assert_eq!(json["en"]["title"], "Hi");
        assert_eq!(json["hi"]["content"], "दुनिया");
        assert!(json.get("gu").is_none());
    }

    #[test]
    fn test_snapshot_rejects_unknown_locale_keys() {
        let json = r#"{"en": {"title": "a", "content": "b"}, "fr": {"title": "c", "content": "d"}}"#;
        assert!(serde_json::from_str::<TranslationSnapshot>(json).is_err());
    }

    #[test]
    fn test_snapshot_serializes_in_enumeration_order() {
        let mut snapshot = TranslationSnapshot::new();
        snapshot.insert(Locale::Gu, LocalizedText::new("g", "g"));
        snapshot.insert(Locale::En, LocalizedText::new("e", "e"));
        snapshot.insert(Locale::Hi, LocalizedText::new("h", "h"));

        let json = serde_json::to_string(&snapshot).expect("serialize");
        let position = |code: &str| json.find(&format!("\"{}\"", code)).expect("key present");
        assert!(position("en") < position("hi"));
        assert!(position("hi") < position("gu"));
        assert_eq!(snapshot.len(), Locale::ALL.len());
    }

    #[test]
    fn test_snapshot_incomplete() {
        let mut snapshot = TranslationSnapshot::new();
        assert!(snapshot.is_empty());
        snapshot.insert(Locale::En, LocalizedText::new("e", "e"));
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.get(Locale::Hi).is_none());
    }

    #[test]
    fn test_post_changes_is_empty() {
        assert!(PostChanges::default().is_empty());
        let changes = PostChanges {
            title: Some("New".to_string()),
            content: None,
        };
        assert!(!changes.is_empty());
    }
}

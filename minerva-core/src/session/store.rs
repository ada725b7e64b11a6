//! Session data structures

use serde::{Deserialize, Serialize};

/// Number of characters of the first message used for a derived title
pub const TITLE_PREVIEW_CHARS: usize = 20;

/// Title given to a session that has no messages yet
pub const DEFAULT_TITLE: &str = "New Chat";

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A conversation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session id (UUID v4, generated client-side)
    pub id: String,
    /// Display title
    pub title: String,
    /// Creation time in milliseconds since the Unix epoch; never updated
    pub timestamp: i64,
    /// Transcript, oldest first
    pub messages: Vec<Message>,
    /// User labels, no duplicates
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Session {
    /// Create a session record from its first transcript
    pub fn new(id: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            id: id.into(),
            title: derive_title(&messages),
            timestamp: now_ms(),
            messages,
            tags: Vec::new(),
        }
    }

    /// Add a tag. Returns false when it was already present.
    pub fn insert_tag(&mut self, tag: &str) -> bool {
        if self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    /// Remove a tag. Returns false when it was not present.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }
}

/// Derive a display title from the first message of a transcript.
///
/// Takes the first [`TITLE_PREVIEW_CHARS`] characters (never splitting a
/// multi-byte character); falls back to [`DEFAULT_TITLE`] when there is no
/// first message or it is empty.
pub fn derive_title(messages: &[Message]) -> String {
    messages
        .first()
        .map(|m| m.content.chars().take(TITLE_PREVIEW_CHARS).collect::<String>())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

/// Current time in milliseconds since the Unix epoch
pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Message::assistant("hi")).unwrap(),
            "{\"role\":\"assistant\",\"content\":\"hi\"}"
        );
    }

    #[test]
    fn test_title_from_first_message() {
        let messages = vec![
            Message::user("Explain quantum computing in simple terms"),
            Message::assistant("Sure."),
        ];
        assert_eq!(derive_title(&messages), "Explain quantum comp");
    }

    #[test]
    fn test_title_short_message_kept_whole() {
        let messages = vec![Message::user("hi there")];
        assert_eq!(derive_title(&messages), "hi there");
    }

    #[test]
    fn test_title_counts_characters_not_bytes() {
        let messages = vec![Message::user("量子コンピュータの仕組みを簡単に説明してください")];
        assert_eq!(derive_title(&messages), "量子コンピュータの仕組みを簡単に説明して");
    }

    #[test]
    fn test_title_defaults_when_empty() {
        assert_eq!(derive_title(&[]), DEFAULT_TITLE);
        assert_eq!(derive_title(&[Message::user("")]), DEFAULT_TITLE);
    }

    #[test]
    fn test_tags_are_a_set() {
        let mut session = Session::new("s1", vec![Message::user("hello")]);
        assert!(session.insert_tag("work"));
        assert!(!session.insert_tag("work"));
        assert_eq!(session.tags, vec!["work"]);

        assert!(session.remove_tag("work"));
        assert!(!session.remove_tag("work"));
        assert!(session.tags.is_empty());
    }

    #[test]
    fn test_session_without_tags_field_still_loads() {
        let raw = r#"{"id":"a","title":"t","timestamp":1,"messages":[]}"#;
        let session: Session = serde_json::from_str(raw).unwrap();
        assert!(session.tags.is_empty());
    }
}

use cliniq_model::Message;
use serde::{Deserialize, Serialize};

const TITLE_WORDS: usize = 5;

/// A persisted chat session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    /// Assigned once at first save, never changed.
    pub id: String,
    pub title: String,
    /// Epoch milliseconds of the last save.
    pub timestamp: i64,
    pub messages: Vec<Message>,
}

/// What a caller hands to [`crate::SessionStore::save_record`].  `title` is
/// raw text; the store shortens it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDraft {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
}

impl RecordDraft {
    pub fn new(id: impl Into<String>, title: impl Into<String>, messages: Vec<Message>) -> Self {
        Self { id: id.into(), title: title.into(), messages }
    }
}

/// First five words joined by single spaces, with `...` appended when the
/// text had more.
pub fn derive_title(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut title = words.iter().take(TITLE_WORDS).copied().collect::<Vec<_>>().join(" ");
    if words.len() > TITLE_WORDS {
        title.push_str("...");
    }
    title
}

// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use cliniq_config::StoreConfig;
use tracing::{debug, warn};

use crate::{derive_title, BlobStore, ChatRecord, FileBlobStore, RecordDraft, StoreError};

const ID_SUFFIX_LEN: usize = 7;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Source of "now" in epoch milliseconds.
pub type Clock = Box<dyn Fn() -> i64 + Send + Sync>;

fn system_clock() -> Clock {
    Box::new(|| chrono::Utc::now().timestamp_millis())
}

/// Chat history kept as one JSON array under a single blob key.
///
/// Every operation reads the blob fresh, so several stores over the same
/// backend see each other's writes.  Read failures degrade to an empty
/// history and write failures are logged; the caller's in-memory transcript
/// stays authoritative either way.
pub struct SessionStore<B: BlobStore> {
    blobs: B,
    key: String,
    clock: Clock,
}

impl SessionStore<FileBlobStore> {
    /// File-backed store at the configured directory.
    pub fn open(cfg: &StoreConfig) -> Self {
        Self::new(FileBlobStore::new(cfg.resolved_dir()), cfg.history_key.clone())
    }
}

impl<B: BlobStore> SessionStore<B> {
    pub fn new(blobs: B, key: impl Into<String>) -> Self {
        Self { blobs, key: key.into(), clock: system_clock() }
    }

    /// Replace the wall clock, e.g. with a counter in tests.
    pub fn with_clock(mut self, clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    fn now(&self) -> i64 {
        (self.clock)()
    }

    // ─── Read ────────────────────────────────────────────────────────────────

    /// All records, newest first.  Missing or unreadable data is an empty
    /// history.
    pub fn load_history(&self) -> Vec<ChatRecord> {
        let raw = match self.blobs.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to read chat history");
                return Vec::new();
            }
        };
        let mut records: Vec<ChatRecord> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to parse chat history");
                return Vec::new();
            }
        };
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records
    }

    pub fn get_record(&self, id: &str) -> Option<ChatRecord> {
        self.load_history().into_iter().find(|r| r.id == id)
    }

    /// Like [`get_record`](Self::get_record) but a miss is an error.
    pub fn require_record(&self, id: &str) -> Result<ChatRecord, StoreError> {
        self.get_record(id).ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    // ─── Write ───────────────────────────────────────────────────────────────

    /// Insert or replace the record with `draft.id`.  The title is shortened
    /// and the timestamp set to now on every save.
    pub fn save_record(&self, draft: RecordDraft) -> Result<ChatRecord, StoreError> {
        if draft.messages.is_empty() {
            return Err(StoreError::EmptyTranscript { id: draft.id });
        }
        let record = ChatRecord {
            title: derive_title(&draft.title),
            timestamp: self.now(),
            id: draft.id,
            messages: draft.messages,
        };

        let mut history = self.load_history();
        match history.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => history.push(record.clone()),
        }
        self.write(&history);
        debug!(id = %record.id, messages = record.messages.len(), "saved chat record");
        Ok(record)
    }

    /// Remove the record with `id` (if any) and return what is left, newest
    /// first.
    pub fn delete_record_from_history(&self, id: &str) -> Vec<ChatRecord> {
        let mut history = self.load_history();
        history.retain(|r| r.id != id);
        self.write(&history);
        history
    }

    fn write(&self, history: &[ChatRecord]) {
        let json = match serde_json::to_string(history) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to serialize chat history");
                return;
            }
        };
        if let Err(e) = self.blobs.set(&self.key, &json) {
            warn!(key = %self.key, error = %e, "failed to write chat history");
        }
    }

    // ─── Identity ────────────────────────────────────────────────────────────

    /// `chat_<epoch-ms>_<7 base-36 chars>`.
    pub fn generate_chat_id(&self) -> String {
        let mut n = uuid::Uuid::new_v4().as_u128();
        let mut suffix = String::with_capacity(ID_SUFFIX_LEN);
        for _ in 0..ID_SUFFIX_LEN {
            suffix.push(BASE36[(n % 36) as usize] as char);
            n /= 36;
        }
        format!("chat_{}_{}", self.now(), suffix)
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    use cliniq_model::Message;

    use super::*;
    use crate::MemoryBlobStore;

    const KEY: &str = "psychiatrist_chat_history";

    /// Store whose clock advances by 1000 ms per call.
    fn ticking_store() -> SessionStore<Arc<MemoryBlobStore>> {
        let t = AtomicI64::new(1_000);
        SessionStore::new(Arc::new(MemoryBlobStore::new()), KEY)
            .with_clock(move || t.fetch_add(1_000, Ordering::SeqCst))
    }

    fn draft(id: &str, title: &str) -> RecordDraft {
        RecordDraft::new(id, title, vec![Message::ai("welcome"), Message::user(title)])
    }

    // ── Load ──────────────────────────────────────────────────────────────────

    #[test]
    fn missing_blob_is_empty_history() {
        assert!(ticking_store().load_history().is_empty());
    }

    #[test]
    fn corrupt_blob_is_empty_history() {
        let s = ticking_store();
        s.blobs().set(KEY, "{not json").unwrap();
        assert!(s.load_history().is_empty());
    }

    #[test]
    fn load_sorts_newest_first() {
        let s = ticking_store();
        s.blobs()
            .set(
                KEY,
                r#"[{"id":"a","title":"A","timestamp":1,"messages":[{"role":"user","text":"x"}]},
                    {"id":"b","title":"B","timestamp":3,"messages":[{"role":"user","text":"y"}]},
                    {"id":"c","title":"C","timestamp":2,"messages":[{"role":"user","text":"z"}]}]"#,
            )
            .unwrap();
        let ids: Vec<String> = s.load_history().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, ["b", "c", "a"]);
    }

    // ── Save ──────────────────────────────────────────────────────────────────

    #[test]
    fn save_derives_title_and_stamps_time() {
        let s = ticking_store();
        let r = s.save_record(draft("chat_1", "one two three four five six seven")).unwrap();
        assert_eq!(r.title, "one two three four five...");
        assert_eq!(r.timestamp, 1_000);
        assert_eq!(s.get_record("chat_1"), Some(r));
    }

    #[test]
    fn later_save_comes_first() {
        let s = ticking_store();
        let first = s.save_record(draft("x", "first")).unwrap();
        let second = s.save_record(draft("y", "second")).unwrap();
        assert!(first.timestamp < second.timestamp);
        let ids: Vec<String> = s.load_history().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, ["y", "x"]);
    }

    #[test]
    fn saving_same_id_replaces_record() {
        let s = ticking_store();
        let x = s.save_record(draft("same", "before")).unwrap();
        let y = s.save_record(draft("same", "after edit")).unwrap();
        let history = s.load_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].title, "after edit");
        assert_eq!(history[0].messages, y.messages);
        assert!(history[0].timestamp >= x.timestamp);
    }

    #[test]
    fn empty_transcript_is_rejected() {
        let s = ticking_store();
        let err = s.save_record(RecordDraft::new("e", "t", vec![])).unwrap_err();
        assert!(matches!(err, StoreError::EmptyTranscript { ref id } if id == "e"));
        assert!(s.load_history().is_empty());
    }

    #[test]
    fn write_failure_still_returns_record() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let s = SessionStore::new(FileBlobStore::new(tmp.path()), KEY).with_clock(|| 7);
        let r = s.save_record(draft("w", "title")).unwrap();
        assert_eq!(r.timestamp, 7);
        assert!(s.load_history().is_empty());
    }

    #[test]
    fn file_backed_store_persists_across_instances() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = StoreConfig { dir: Some(tmp.path().to_path_buf()), history_key: KEY.into() };
        SessionStore::open(&cfg).save_record(draft("p", "persisted")).unwrap();
        let again = SessionStore::open(&cfg);
        assert_eq!(again.get_record("p").map(|r| r.title), Some("persisted".to_string()));
        assert!(tmp.path().join(format!("{KEY}.json")).exists());
    }

    // ── Delete ────────────────────────────────────────────────────────────────

    #[test]
    fn delete_removes_only_the_match() {
        let s = ticking_store();
        s.save_record(draft("a", "a")).unwrap();
        s.save_record(draft("b", "b")).unwrap();
        let left = s.delete_record_from_history("a");
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, "b");
        assert_eq!(s.load_history(), left);
    }

    #[test]
    fn delete_is_idempotent() {
        let s = ticking_store();
        s.save_record(draft("a", "a")).unwrap();
        let once = s.delete_record_from_history("a");
        let twice = s.delete_record_from_history("a");
        assert!(once.is_empty());
        assert_eq!(once, twice);
        assert!(s.delete_record_from_history("never-existed").is_empty());
    }

    #[test]
    fn require_record_reports_missing_id() {
        let err = ticking_store().require_record("ghost").unwrap_err();
        assert_eq!(err.to_string(), "no saved chat with id ghost");
    }

    // ── Identity ──────────────────────────────────────────────────────────────

    #[test]
    fn chat_id_format() {
        let s = ticking_store().with_clock(|| 1_700_000_000_000);
        let id = s.generate_chat_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "chat");
        assert_eq!(parts[1], "1700000000000");
        assert_eq!(parts[2].len(), 7);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn chat_ids_are_unique() {
        let s = ticking_store().with_clock(|| 42);
        let ids: std::collections::HashSet<String> = (0..100).map(|_| s.generate_chat_id()).collect();
        assert_eq!(ids.len(), 100);
    }
}

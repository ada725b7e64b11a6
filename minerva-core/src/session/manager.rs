//! Session store for handling multiple conversations
//!
//! The whole store serializes as one JSON document (a map from session id
//! to session record). Every persisted mutation rewrites the document, so
//! the last writer wins. Storage failures are logged and swallowed: a chat
//! must keep working when the disk does not.

use super::store::{Message, Session};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

/// Metadata patch applied by [`SessionStore::update_meta`]
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub title: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl SessionPatch {
    /// Patch that only renames
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            tags: None,
        }
    }
}

/// Stores every conversation and tracks which one is being viewed
#[derive(Debug)]
pub struct SessionStore {
    /// Location of the persisted JSON document
    path: PathBuf,
    /// All known sessions, keyed by id
    sessions: HashMap<String, Session>,
    /// Id of the session being viewed; always set
    active_id: String,
    /// Display transcript of the active session. May run ahead of
    /// `sessions` while an exchange is in flight.
    view: Vec<Message>,
}

impl SessionStore {
    /// Open the store at `path`. A missing or unreadable document degrades
    /// to an empty store; it never fails.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let sessions = read_document(&path);
        Self {
            path,
            sessions,
            active_id: fresh_id(),
            view: Vec::new(),
        }
    }

    /// Id of the session being viewed
    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    /// Display transcript of the active session
    pub fn active_messages(&self) -> &[Message] {
        &self.view
    }

    /// Look up a stored session
    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// Look up a stored session, erroring when it does not exist
    pub fn require(&self, id: &str) -> crate::Result<&Session> {
        self.get(id)
            .ok_or_else(|| crate::Error::Session(format!("no session with id {}", id)))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Transcript for `id`: the live view for the active session (which may
    /// include unpersisted updates), the stored transcript otherwise.
    pub fn messages_of(&self, id: &str) -> Vec<Message> {
        if id == self.active_id {
            self.view.clone()
        } else {
            self.sessions
                .get(id)
                .map(|s| s.messages.clone())
                .unwrap_or_default()
        }
    }

    /// Start viewing a fresh session and return its id. Nothing is written:
    /// the record materializes on the first persisted message update.
    pub fn start_new(&mut self) -> String {
        self.active_id = fresh_id();
        self.view.clear();
        self.active_id.clone()
    }

    /// Switch the view to `id`. An unknown id shows an empty transcript
    /// until a message update materializes it.
    pub fn select(&mut self, id: &str) {
        self.active_id = id.to_string();
        self.view = self
            .sessions
            .get(id)
            .map(|s| s.messages.clone())
            .unwrap_or_default();
    }

    /// Replace the transcript of `id`.
    ///
    /// With `persist` false only the display state changes; the map and the
    /// document are untouched. With `persist` true the record is upserted
    /// (title and creation timestamp are derived once and then kept) and
    /// the document rewritten.
    pub fn update_messages(&mut self, id: &str, messages: Vec<Message>, persist: bool) {
        if id == self.active_id {
            self.view = messages.clone();
        }
        if !persist {
            return;
        }

        match self.sessions.entry(id.to_string()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().messages = messages;
            }
            Entry::Vacant(entry) => {
                entry.insert(Session::new(id, messages));
            }
        }
        self.persist();
    }

    /// Shallow-merge title and tags into an existing session. Unknown ids
    /// are ignored; a partial record is never created.
    pub fn update_meta(&mut self, id: &str, patch: SessionPatch) {
        let Some(session) = self.sessions.get_mut(id) else {
            return;
        };
        if let Some(title) = patch.title {
            session.title = title;
        }
        if let Some(tags) = patch.tags {
            session.tags = tags;
        }
        self.persist();
    }

    /// Add a tag to a session. Duplicates and unknown ids are no-ops.
    pub fn add_tag(&mut self, id: &str, tag: &str) -> bool {
        let changed = self
            .sessions
            .get_mut(id)
            .map(|s| s.insert_tag(tag))
            .unwrap_or(false);
        if changed {
            self.persist();
        }
        changed
    }

    /// Remove a tag from a session. Missing tags and unknown ids are no-ops.
    pub fn remove_tag(&mut self, id: &str, tag: &str) -> bool {
        let changed = self
            .sessions
            .get_mut(id)
            .map(|s| s.remove_tag(tag))
            .unwrap_or(false);
        if changed {
            self.persist();
        }
        changed
    }

    /// Delete a session. Deleting the one being viewed switches to a fresh
    /// empty session.
    pub fn delete(&mut self, id: &str) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if id == self.active_id {
            self.start_new();
        }
        if removed {
            self.persist();
        }
        removed
    }

    /// Delete every session and start a fresh one. Destructive; the caller
    /// must confirm with the user first.
    pub fn clear_all(&mut self) {
        self.sessions.clear();
        self.start_new();
        self.persist();
    }

    /// All sessions, newest created first. Later message updates do not
    /// reorder (the creation timestamp never changes).
    pub fn recent(&self) -> Vec<&Session> {
        let mut sessions: Vec<&Session> = self.sessions.values().collect();
        sessions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        sessions
    }

    fn persist(&self) {
        if let Err(e) = self.write_document() {
            warn!("Failed to persist sessions to {}: {}", self.path.display(), e);
        }
    }

    fn write_document(&self) -> crate::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.sessions)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

fn fresh_id() -> String {
    Uuid::new_v4().to_string()
}

fn read_document(path: &Path) -> HashMap<String, Session> {
    if !path.exists() {
        return HashMap::new();
    }
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read sessions from {}: {}", path.display(), e);
            return HashMap::new();
        }
    };
    match serde_json::from_str(&content) {
        Ok(sessions) => sessions,
        Err(e) => {
            warn!(
                "Sessions file {} did not parse, starting empty: {}",
                path.display(),
                e
            );
            HashMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_path(dir: &TempDir) -> PathBuf {
        dir.path().join("sessions.json")
    }

    #[test]
    fn test_fresh_store_is_empty_with_active_id() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::open(store_path(&temp_dir));

        assert!(store.is_empty());
        assert!(!store.active_id().is_empty());
        assert!(store.active_messages().is_empty());
    }

    #[test]
    fn test_persisted_update_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = store_path(&temp_dir);

        let mut store = SessionStore::open(&path);
        let id = store.start_new();
        store.update_messages(
            &id,
            vec![Message::user("hello"), Message::assistant("hi")],
            true,
        );

        let reopened = SessionStore::open(&path);
        let session = reopened.get(&id).unwrap();
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0].content, "hello");
        assert_eq!(session.title, "hello");
    }

    #[test]
    fn test_unpersisted_update_changes_view_only() {
        let temp_dir = TempDir::new().unwrap();
        let path = store_path(&temp_dir);

        let mut store = SessionStore::open(&path);
        let id = store.start_new();
        store.update_messages(&id, vec![Message::user("draft")], false);

        assert_eq!(store.active_messages().len(), 1);
        assert!(store.get(&id).is_none());
        assert!(!path.exists());

        let reopened = SessionStore::open(&path);
        assert!(reopened.is_empty());
    }

    #[test]
    fn test_upsert_keeps_title_and_timestamp() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SessionStore::open(store_path(&temp_dir));

        let id = store.start_new();
        store.update_messages(&id, vec![Message::user("first question")], true);
        let created = store.get(&id).unwrap().timestamp;

        store.update_meta(&id, SessionPatch::title("My research"));
        store.update_messages(
            &id,
            vec![
                Message::user("first question"),
                Message::assistant("answer"),
                Message::user("another question that is much longer"),
            ],
            true,
        );

        let session = store.get(&id).unwrap();
        assert_eq!(session.title, "My research");
        assert_eq!(session.timestamp, created);
        assert_eq!(session.messages.len(), 3);
    }

    #[test]
    fn test_select_unknown_id_shows_empty_view() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SessionStore::open(store_path(&temp_dir));

        store.select("nonexistent");
        assert_eq!(store.active_id(), "nonexistent");
        assert!(store.active_messages().is_empty());

        store.update_messages("nonexistent", vec![Message::user("now it exists")], true);
        assert!(store.get("nonexistent").is_some());
    }

    #[test]
    fn test_delete_active_session_starts_fresh() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SessionStore::open(store_path(&temp_dir));

        let id = store.start_new();
        store.update_messages(&id, vec![Message::user("hello")], true);
        assert!(store.delete(&id));

        assert_ne!(store.active_id(), id);
        assert!(store.active_messages().is_empty());
        assert!(store.get(&id).is_none());
    }

    #[test]
    fn test_delete_other_session_keeps_view() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SessionStore::open(store_path(&temp_dir));

        let old = store.start_new();
        store.update_messages(&old, vec![Message::user("old chat")], true);

        let current = store.start_new();
        store.update_messages(&current, vec![Message::user("current chat")], true);

        assert!(store.delete(&old));
        assert_eq!(store.active_id(), current);
        assert_eq!(store.active_messages().len(), 1);
        assert!(!store.delete(&old));
    }

    #[test]
    fn test_clear_all_empties_and_rotates_active() {
        let temp_dir = TempDir::new().unwrap();
        let path = store_path(&temp_dir);

        let mut store = SessionStore::open(&path);
        let id = store.start_new();
        store.update_messages(&id, vec![Message::user("hello")], true);

        store.clear_all();
        assert!(store.is_empty());
        assert_ne!(store.active_id(), id);

        let reopened = SessionStore::open(&path);
        assert!(reopened.is_empty());
    }

    #[test]
    fn test_update_meta_unknown_id_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let path = store_path(&temp_dir);

        let mut store = SessionStore::open(&path);
        store.update_meta("ghost", SessionPatch::title("should not appear"));

        assert!(store.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_tag_ops_persist_only_on_change() {
        let temp_dir = TempDir::new().unwrap();
        let path = store_path(&temp_dir);

        let mut store = SessionStore::open(&path);
        let id = store.start_new();
        store.update_messages(&id, vec![Message::user("hello")], true);

        assert!(store.add_tag(&id, "work"));
        assert!(!store.add_tag(&id, "work"));
        assert!(!store.add_tag("ghost", "work"));

        let reopened = SessionStore::open(&path);
        assert_eq!(reopened.get(&id).unwrap().tags, vec!["work"]);

        assert!(store.remove_tag(&id, "work"));
        assert!(!store.remove_tag(&id, "work"));
    }

    #[test]
    fn test_corrupt_document_degrades_to_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = store_path(&temp_dir);
        std::fs::write(&path, "{ not json").unwrap();

        let store = SessionStore::open(&path);
        assert!(store.is_empty());
        assert!(!store.active_id().is_empty());
    }

    #[test]
    fn test_recent_orders_by_creation_descending() {
        let temp_dir = TempDir::new().unwrap();
        let path = store_path(&temp_dir);

        let mut seeded: HashMap<String, Session> = HashMap::new();
        for (id, ts) in [("a", 100), ("b", 300), ("c", 200)] {
            let mut session = Session::new(id, vec![Message::user(id)]);
            session.timestamp = ts;
            seeded.insert(id.to_string(), session);
        }
        std::fs::write(&path, serde_json::to_string_pretty(&seeded).unwrap()).unwrap();

        let mut store = SessionStore::open(&path);
        let ids: Vec<&str> = store.recent().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);

        // Editing an old session must not move it up.
        store.update_messages(
            "a",
            vec![Message::user("a"), Message::assistant("edited")],
            true,
        );
        let ids: Vec<&str> = store.recent().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }
}

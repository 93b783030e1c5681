//! The counter document and its file-backed store.
//!
//! Counters live in a single JSON file shaped as
//! `{"users": {"<user id>": {"name", "joins", "leaves", "moves"}}}`.
//! Every operation loads the whole document and every mutation rewrites it
//! wholesale. [`CounterStore`] is the seam between the document types and the
//! backing medium; [`MemoryStore`] stands in for the file in tests.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serenity::prelude::TypeMapKey;
use thiserror::Error;

/// One of the three per-user tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Joins,
    Leaves,
    Moves,
}

impl Counter {
    /// The token used as slash-command choice value and in replies.
    pub fn as_str(self) -> &'static str {
        match self {
            Counter::Joins => "joins",
            Counter::Leaves => "leaves",
            Counter::Moves => "moves",
        }
    }

    /// Parse one of the literal tokens `joins`, `leaves` or `moves`.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "joins" => Some(Counter::Joins),
            "leaves" => Some(Counter::Leaves),
            "moves" => Some(Counter::Moves),
            _ => None,
        }
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-user record exactly as it appears in the file.
///
/// Counters are signed: the manual edit command may set any value, including
/// negative ones, and the event pipeline keeps counting from there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRecord {
    /// Display name captured from the most recent event for this user.
    pub name: String,
    pub joins: i64,
    pub leaves: i64,
    pub moves: i64,
}

impl CounterRecord {
    fn zeroed(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            joins: 0,
            leaves: 0,
            moves: 0,
        }
    }

    pub fn get(&self, counter: Counter) -> i64 {
        match counter {
            Counter::Joins => self.joins,
            Counter::Leaves => self.leaves,
            Counter::Moves => self.moves,
        }
    }

    fn slot(&mut self, counter: Counter) -> &mut i64 {
        match counter {
            Counter::Joins => &mut self.joins,
            Counter::Leaves => &mut self.leaves,
            Counter::Moves => &mut self.moves,
        }
    }
}

/// The three counts reported by `/stats`, for one user or summed over all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub joins: i64,
    pub leaves: i64,
    pub moves: i64,
}

/// The whole persisted document: user id (as decimal string) to record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterDocument {
    pub users: HashMap<String, CounterRecord>,
}

impl CounterDocument {
    /// Insert a zeroed record for `user_id` if none exists, otherwise refresh
    /// only the display name. Counters are never reset by this.
    pub fn ensure_user(&mut self, user_id: &str, display_name: &str) {
        self.users
            .entry(user_id.to_owned())
            .and_modify(|record| record.name = display_name.to_owned())
            .or_insert_with(|| CounterRecord::zeroed(display_name));
    }

    /// Bump one counter for a user already present in the document.
    pub fn increment(&mut self, user_id: &str, counter: Counter) {
        if let Some(record) = self.users.get_mut(user_id) {
            *record.slot(counter) += 1;
        }
    }

    /// Overwrite one counter. Returns `false` when the user is untracked;
    /// manual edits never create records.
    pub fn set_counter(&mut self, user_id: &str, counter: Counter, value: i64) -> bool {
        match self.users.get_mut(user_id) {
            Some(record) => {
                *record.slot(counter) = value;
                true
            }
            None => false,
        }
    }

    /// Counters for one user, zero-filled when untracked.
    pub fn tally_user(&self, user_id: &str) -> Tally {
        self.users.get(user_id).map_or_else(Tally::default, |record| Tally {
            joins: record.joins,
            leaves: record.leaves,
            moves: record.moves,
        })
    }

    /// Componentwise sum over every tracked user.
    pub fn tally_global(&self) -> Tally {
        self.users.values().fold(Tally::default(), |acc, record| Tally {
            joins: acc.joins + record.joins,
            leaves: acc.leaves + record.leaves,
            moves: acc.moves + record.moves,
        })
    }
}

/// Failures of the backing document. The triggering operation aborts and the
/// caller decides what to report; the file is never clobbered on read errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("counter file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("counter file is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Load/save seam over the backing medium.
pub trait CounterStore: Send + Sync {
    /// Read the whole document, initializing an empty one on first run.
    fn load(&self) -> Result<CounterDocument, StoreError>;

    /// Replace the whole document.
    fn save(&self, doc: &CounterDocument) -> Result<(), StoreError>;
}

/// Production store: one pretty-printed JSON file, replaced on every save by
/// writing a sibling temp file and renaming it over the original.
#[derive(Debug, Clone)]
pub struct JsonCounterStore {
    path: PathBuf,
}

impl JsonCounterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn replace(&self, doc: &CounterDocument) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, serde_json::to_string_pretty(doc)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl CounterStore for JsonCounterStore {
    fn load(&self) -> Result<CounterDocument, StoreError> {
        if !self.path.exists() {
            let doc = CounterDocument::default();
            self.replace(&doc)?;
            return Ok(doc);
        }
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, doc: &CounterDocument) -> Result<(), StoreError> {
        self.replace(doc)
    }
}

/// In-memory substitute with the same whole-document semantics.
#[derive(Debug, Default)]
pub struct MemoryStore {
    doc: Mutex<CounterDocument>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(doc: CounterDocument) -> Self {
        Self {
            doc: Mutex::new(doc),
        }
    }
}

impl CounterStore for MemoryStore {
    fn load(&self) -> Result<CounterDocument, StoreError> {
        Ok(self.doc.lock().expect("counter document lock poisoned").clone())
    }

    fn save(&self, doc: &CounterDocument) -> Result<(), StoreError> {
        *self.doc.lock().expect("counter document lock poisoned") = doc.clone();
        Ok(())
    }
}

/// TypeMap slot carrying the shared store handle injected at client startup.
pub struct SharedCounterStore;

impl TypeMapKey for SharedCounterStore {
    type Value = Arc<dyn CounterStore>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn doc_with(user_id: &str, name: &str, joins: i64, leaves: i64, moves: i64) -> CounterDocument {
        let mut doc = CounterDocument::default();
        doc.users.insert(
            user_id.to_owned(),
            CounterRecord {
                name: name.to_owned(),
                joins,
                leaves,
                moves,
            },
        );
        doc
    }

    #[test]
    fn ensure_user_creates_zeroed_record() {
        let mut doc = CounterDocument::default();
        doc.ensure_user("42", "nia#1337");

        let record = &doc.users["42"];
        assert_eq!(record.name, "nia#1337");
        assert_eq!((record.joins, record.leaves, record.moves), (0, 0, 0));
    }

    #[test]
    fn ensure_user_refreshes_name_but_keeps_counters() {
        let mut doc = doc_with("42", "old-name", 3, 1, 2);
        doc.ensure_user("42", "new-name");
        doc.ensure_user("42", "new-name");

        let record = &doc.users["42"];
        assert_eq!(record.name, "new-name");
        assert_eq!((record.joins, record.leaves, record.moves), (3, 1, 2));
        assert_eq!(doc.users.len(), 1);
    }

    #[test]
    fn increment_ignores_untracked_users() {
        let mut doc = CounterDocument::default();
        doc.increment("42", Counter::Joins);
        assert!(doc.users.is_empty());
    }

    #[test]
    fn set_counter_rejects_untracked_users() {
        let mut doc = CounterDocument::default();
        assert!(!doc.set_counter("42", Counter::Moves, 5));
        assert!(doc.users.is_empty());
    }

    #[test]
    fn set_counter_overwrites_exactly() {
        let mut doc = doc_with("42", "nia", 3, 1, 2);
        assert!(doc.set_counter("42", Counter::Joins, -7));
        assert_eq!(doc.users["42"].get(Counter::Joins), -7);
        assert_eq!(doc.users["42"].get(Counter::Leaves), 1);
    }

    #[test]
    fn tally_user_zero_fills_unknowns() {
        let doc = doc_with("42", "nia", 3, 1, 2);
        assert_eq!(doc.tally_user("999"), Tally::default());
        assert_eq!(
            doc.tally_user("42"),
            Tally {
                joins: 3,
                leaves: 1,
                moves: 2
            }
        );
    }

    #[test]
    fn tally_global_sums_every_record() {
        let mut doc = doc_with("1", "a", 1, 2, 3);
        doc.users.insert(
            "2".to_owned(),
            CounterRecord {
                name: "b".to_owned(),
                joins: 10,
                leaves: 20,
                moves: -3,
            },
        );

        assert_eq!(
            doc.tally_global(),
            Tally {
                joins: 11,
                leaves: 22,
                moves: 0
            }
        );
    }

    #[test]
    fn counter_tokens_round_trip() {
        for counter in [Counter::Joins, Counter::Leaves, Counter::Moves] {
            assert_eq!(Counter::parse(counter.as_str()), Some(counter));
        }
        assert_eq!(Counter::parse("join"), None);
        assert_eq!(Counter::parse(""), None);
    }

    #[test]
    fn load_initializes_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("counters.json");
        let store = JsonCounterStore::new(&path);

        let doc = store.load().unwrap();
        assert!(doc.users.is_empty());

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, serde_json::json!({ "users": {} }));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = JsonCounterStore::new(dir.path().join("counters.json"));

        let doc = doc_with("42", "nia#1337", 3, 1, -2);
        store.save(&doc).unwrap();
        assert_eq!(store.load().unwrap(), doc);
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = JsonCounterStore::new(dir.path().join("state/voice/counters.json"));

        store.save(&doc_with("1", "a", 0, 0, 0)).unwrap();
        assert_eq!(store.load().unwrap().users.len(), 1);
    }

    #[test]
    fn load_reports_malformed_documents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("counters.json");
        std::fs::write(&path, "{\"users\": [1, 2]}").unwrap();

        let err = JsonCounterStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Malformed(_)));
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let dir = TempDir::new().unwrap();
        let store = JsonCounterStore::new(dir.path().join("counters.json"));
        store.save(&CounterDocument::default()).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec!["counters.json"]);
    }

    #[test]
    fn memory_store_mirrors_file_semantics() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().users.is_empty());

        let doc = doc_with("42", "nia", 1, 0, 0);
        store.save(&doc).unwrap();
        assert_eq!(store.load().unwrap(), doc);
    }
}

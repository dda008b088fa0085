//! Local persistence.
//!
//! Everything is stored as strings under two kinds of keys: the entry list
//! (`devbrain_entries`, a JSON array) and one highlight term per entry
//! (`term:<entry id>`).

use crate::error::StoreError;
use crate::models::{Category, CodeSnippet, KnowledgeEntry};
use chrono::DateTime;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

pub const ENTRIES_KEY: &str = "devbrain_entries";

pub fn term_key(entry_id: &str) -> String {
    format!("term:{}", entry_id)
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

// ============================================================================
// Backends
// ============================================================================

pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Ok(Self {
            db: sled::open(path)?,
        })
    }

    /// A database that is deleted when dropped.
    pub fn temporary() -> Result<Self, StoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.db.get(key.as_bytes())? {
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(|_| StoreError::Encoding(key.to_string())),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.db.insert(key.as_bytes(), value.as_bytes())?;
        self.db.flush()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.db.remove(key.as_bytes())?;
        self.db.flush()?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

// ============================================================================
// Entries and terms
// ============================================================================

/// Load all entries, newest first. An empty store yields the sample entries.
pub fn load_entries(store: &dyn KeyValueStore) -> Result<Vec<KnowledgeEntry>, StoreError> {
    match store.get(ENTRIES_KEY)? {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => {
            tracing::info!("no saved entries, starting from sample data");
            Ok(sample_entries())
        }
    }
}

pub fn save_entries(store: &dyn KeyValueStore, entries: &[KnowledgeEntry]) -> Result<(), StoreError> {
    let json = serde_json::to_string(entries)?;
    store.set(ENTRIES_KEY, &json)
}

pub fn load_term(store: &dyn KeyValueStore, entry_id: &str) -> Result<Option<String>, StoreError> {
    Ok(store
        .get(&term_key(entry_id))?
        .filter(|term| !term.trim().is_empty()))
}

/// Persist `term`; `None` clears it.
pub fn save_term(
    store: &dyn KeyValueStore,
    entry_id: &str,
    term: Option<&str>,
) -> Result<(), StoreError> {
    match term {
        Some(term) => store.set(&term_key(entry_id), term),
        None => store.remove(&term_key(entry_id)),
    }
}

/// Creation time of the sample entry, 2024-01-15 09:30 UTC.
const SAMPLE_CREATED_AT_MS: i64 = 1_705_311_000_000;

/// The entry shown on first run.
pub fn sample_entries() -> Vec<KnowledgeEntry> {
    vec![KnowledgeEntry {
        id: "1".to_string(),
        title: "How to undo the last commit in Git".to_string(),
        summary: "To undo the last commit but keep your changes in the staging area, use a soft reset."
            .to_string(),
        raw_content: "To undo a commit, use git reset. If you want to keep your files in the \
            staging area, use --soft. If you want to discard everything, use --hard. Be careful \
            with --hard because it deletes your work."
            .to_string(),
        category: Category::Procedure,
        steps: vec![
            "Open your terminal.".to_string(),
            "Navigate to the repository.".to_string(),
            "Run: git reset --soft HEAD~1".to_string(),
            "Your files are now staged and ready for a new commit.".to_string(),
        ],
        code_snippets: vec![
            CodeSnippet {
                language: "bash".to_string(),
                code: "git reset --soft HEAD~1".to_string(),
                description: "Undoes the commit but keeps the changes staged.".to_string(),
            },
            CodeSnippet {
                language: "bash".to_string(),
                code: "git reset --hard HEAD~1".to_string(),
                description: "CAUTION: undoes the commit and DELETES all changes.".to_string(),
            },
        ],
        mermaid_chart: Some(
            "flowchart LR\n  A[Commit made] --> B{Mistake?}\n  B -- Yes --> C[Run git reset --soft]\n  \
             C --> D[Changes staged]\n  D --> E[Fix the code]\n  E --> F[Commit again]"
                .to_string(),
        ),
        tags: vec![
            "git".to_string(),
            "version-control".to_string(),
            "terminal".to_string(),
        ],
        image_urls: Vec::new(),
        created_at: DateTime::from_timestamp_millis(SAMPLE_CREATED_AT_MS).unwrap_or_default(),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_entry(id: &str) -> KnowledgeEntry {
        KnowledgeEntry {
            id: id.to_string(),
            title: "Bare".to_string(),
            summary: "Nothing but a summary".to_string(),
            raw_content: String::new(),
            category: Category::General,
            steps: Vec::new(),
            code_snippets: Vec::new(),
            mermaid_chart: None,
            tags: Vec::new(),
            image_urls: Vec::new(),
            created_at: DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
        }
    }

    fn round_trip(store: &dyn KeyValueStore) {
        save_entries(store, &[bare_entry("a")]).unwrap();
        let loaded = load_entries(store).unwrap();
        assert_eq!(loaded, vec![bare_entry("a")]);
        assert!(loaded[0].code_snippets.is_empty());
        assert!(loaded[0].steps.is_empty());
        assert!(loaded[0].image_urls.is_empty());

        let raw = store.get(ENTRIES_KEY).unwrap().unwrap();
        assert!(raw.contains("\"codeSnippets\":[]"));
        assert!(raw.contains("\"steps\":[]"));
        assert!(raw.contains("\"imageUrls\":[]"));
    }

    #[test]
    fn test_sled_round_trip_keeps_empty_sequences() {
        round_trip(&SledStore::temporary().unwrap());
    }

    #[test]
    fn test_memory_round_trip_keeps_empty_sequences() {
        round_trip(&MemoryStore::new());
    }

    #[test]
    fn test_empty_store_yields_samples() {
        let store = MemoryStore::new();
        let entries = load_entries(&store).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, Category::Procedure);
        assert!(entries[0].mermaid_chart.is_some());
        assert_eq!(load_entries(&store).unwrap()[0].created_at, entries[0].created_at);
        assert_eq!(entries[0].created_at.timestamp_millis(), SAMPLE_CREATED_AT_MS);
    }

    #[test]
    fn test_saved_empty_list_is_not_reseeded() {
        let store = MemoryStore::new();
        save_entries(&store, &[]).unwrap();
        assert!(load_entries(&store).unwrap().is_empty());
    }

    #[test]
    fn test_term_persistence() {
        let store = SledStore::temporary().unwrap();
        assert_eq!(load_term(&store, "a").unwrap(), None);

        save_term(&store, "a", Some("git reset")).unwrap();
        assert_eq!(load_term(&store, "a").unwrap(), Some("git reset".to_string()));
        assert_eq!(store.get("term:a").unwrap(), Some("git reset".to_string()));
        assert_eq!(load_term(&store, "b").unwrap(), None);

        save_term(&store, "a", None).unwrap();
        assert_eq!(load_term(&store, "a").unwrap(), None);
    }

    #[test]
    fn test_corrupt_entries_are_an_error() {
        let store = MemoryStore::new();
        store.set(ENTRIES_KEY, "not json").unwrap();
        assert!(matches!(load_entries(&store), Err(StoreError::Json(_))));
    }
}

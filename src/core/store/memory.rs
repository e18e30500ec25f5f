//! In-memory entry store for tests and dry runs.

use super::{EntryIter, EntryStore};
use crate::core::model::{titles_resemble, Entry};
use crate::error::StoreError;
use std::path::PathBuf;
use std::sync::RwLock;
use uuid::Uuid;

/// Entry store backed by a vector in insertion order.
///
/// Supports every query, including identifier lookup.
pub struct InMemoryEntryStore {
    entries: RwLock<Vec<Entry>>,
}

impl InMemoryEntryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Seed the store with entries; missing ids are generated.
    pub fn with_entries(entries: Vec<Entry>) -> Self {
        let store = Self::new();
        for mut entry in entries {
            // A fresh RwLock cannot be poisoned.
            let _ = store.save(&mut entry);
        }
        store
    }

    fn poisoned() -> StoreError {
        StoreError::Corrupted {
            path: PathBuf::from("memory"),
        }
    }

    fn find<F>(&self, predicate: F) -> Result<Option<Entry>, StoreError>
    where
        F: Fn(&Entry) -> bool,
    {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries.iter().find(|e| predicate(*e)).cloned())
    }
}

impl Default for InMemoryEntryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryStore for InMemoryEntryStore {
    fn find_by_id(&self, id: &str) -> Result<Option<Entry>, StoreError> {
        self.find(|e| e.id.as_deref() == Some(id))
    }

    fn find_by_hash(&self, hash: &str) -> Result<Option<Entry>, StoreError> {
        self.find(|e| !hash.is_empty() && e.main_file_hash_sha256 == hash)
    }

    fn find_by_identifiers(
        &self,
        doi: Option<&str>,
        pmid: Option<&str>,
    ) -> Result<Option<Entry>, StoreError> {
        if doi.is_none() && pmid.is_none() {
            return Ok(None);
        }
        self.find(|e| {
            let doi_hit = doi.is_some() && e.doi.as_deref() == doi;
            let pmid_hit = pmid.is_some() && e.pmid.as_deref() == pmid;
            doi_hit || pmid_hit
        })
    }

    fn find_similar_by_name_year(
        &self,
        title: &str,
        year: Option<i32>,
    ) -> Result<Vec<Entry>, StoreError> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries
            .iter()
            .filter(|e| titles_resemble(title, year, &e.title, e.year))
            .cloned()
            .collect())
    }

    fn enumerate_all(&self) -> Result<EntryIter<'_>, StoreError> {
        let snapshot = self.entries.read().map_err(|_| Self::poisoned())?.clone();
        Ok(Box::new(snapshot.into_iter()))
    }

    fn save(&self, entry: &mut Entry) -> Result<String, StoreError> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;

        let id = entry
            .id
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();

        match entries.iter_mut().find(|e| e.id.as_deref() == Some(id.as_str())) {
            Some(existing) => *existing = entry.clone(),
            None => entries.push(entry.clone()),
        }
        Ok(id)
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.entries.read().map_err(|_| Self::poisoned())?.len())
    }
}

//! Entry store trait definition.

use crate::core::model::Entry;
use crate::error::StoreError;

/// Boxed stream of entries returned by [`EntryStore::enumerate_all`]
pub type EntryIter<'a> = Box<dyn Iterator<Item = Entry> + Send + 'a>;

/// Durable store of library entries.
///
/// Staging workers query it concurrently; the committer is its only writer.
pub trait EntryStore: Send + Sync {
    /// Load one entry by id
    fn find_by_id(&self, id: &str) -> Result<Option<Entry>, StoreError>;

    /// Entry whose main file has this content digest
    fn find_by_hash(&self, hash: &str) -> Result<Option<Entry>, StoreError>;

    /// Entry with a matching normalized DOI or PMID.
    ///
    /// Optional capability; stores without an identifier index keep the default.
    fn find_by_identifiers(
        &self,
        _doi: Option<&str>,
        _pmid: Option<&str>,
    ) -> Result<Option<Entry>, StoreError> {
        Err(StoreError::Unsupported("identifier lookup"))
    }

    /// Narrow candidate set for a title (and year, when known)
    fn find_similar_by_name_year(
        &self,
        title: &str,
        year: Option<i32>,
    ) -> Result<Vec<Entry>, StoreError>;

    /// Every entry, in a stable order
    fn enumerate_all(&self) -> Result<EntryIter<'_>, StoreError>;

    /// Insert or update. Assigns `entry.id` when empty and returns it.
    fn save(&self, entry: &mut Entry) -> Result<String, StoreError>;

    /// Number of stored entries
    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.enumerate_all()?.count())
    }
}

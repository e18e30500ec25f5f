//! Integration tests for the two-pass commit.
//!
//! These tests verify:
//! - Entries created for new files
//! - Duplicates leaving the store unchanged
//! - Forward references from attachments to entries created in the same call
//! - One failing item not blocking the rest of either pass
//! - The change log hook

use document_intake::core::hasher::Sha256Hasher;
use document_intake::core::hooks::{ChangeLogAction, ChangeLogRepository};
use document_intake::core::metadata::FilenameExtractor;
use document_intake::core::model::{Entry, StagingItem, SuggestedAction};
use document_intake::core::pipeline::{CancellationToken, IntakePipeline};
use document_intake::core::similarity::ShingleScorer;
use document_intake::core::storage::{BlobStorage, LocalBlobStorage, StorageArea};
use document_intake::core::store::{EntryStore, InMemoryEntryStore, SqliteEntryStore};
use document_intake::error::StorageError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn pipeline(
    root: &Path,
    store: Arc<dyn EntryStore>,
    storage: Arc<dyn BlobStorage>,
) -> IntakePipeline {
    IntakePipeline::builder()
        .store(store)
        .storage(storage)
        .hasher(Arc::new(Sha256Hasher::new()))
        .extractor(Arc::new(FilenameExtractor::new()))
        .scorer(Arc::new(ShingleScorer::new()))
        .config(document_intake::core::pipeline::IntakeConfig {
            library_root: root.to_path_buf(),
            added_by: "integration".to_string(),
            ..Default::default()
        })
        .build()
        .unwrap()
}

#[test]
fn end_to_end_new_files_become_distinct_entries() {
    let temp_dir = TempDir::new().unwrap();
    let lib = temp_dir.path().join("lib");
    let a = write(&lib, "a.pdf", b"%PDF-1.7 alpha alpha alpha");
    let b = write(&lib, "b.pdf", b"%PDF-1.7 beta beta beta beta");

    let store = Arc::new(SqliteEntryStore::open(&temp_dir.path().join("library.db")).unwrap());
    let root = temp_dir.path().join("library-root");
    let pipeline = pipeline(&root, store.clone(), Arc::new(LocalBlobStorage::new(&root)));
    let ct = CancellationToken::new();

    let staged = pipeline.stage_all([&a, &b], &ct).unwrap();
    assert!(staged.iter().all(|i| i.suggested_action == SuggestedAction::New && i.selected));

    let committed = pipeline.commit(staged, &ct).unwrap();
    assert_eq!(committed.len(), 2);

    let entries: Vec<Entry> = store.enumerate_all().unwrap().collect();
    assert_eq!(entries.len(), 2);
    assert_ne!(entries[0].id, entries[1].id);
    for entry in &entries {
        assert_eq!(entry.main_file_hash_sha256.len(), 64);
        assert!(entry.relation_tags.is_empty());
        assert!(root.join(&entry.main_file).is_file());
    }

    // Restaging the same files now finds them by digest
    let again = pipeline.stage_all([&a, &b], &ct).unwrap();
    assert!(again.iter().all(|i| i.suggested_action == SuggestedAction::Duplicate));
}

#[test]
fn committing_duplicates_leaves_store_unchanged() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("root");
    let path = write(&temp_dir.path().join("lib"), "paper.pdf", b"%PDF-1.7 body");

    let store = Arc::new(InMemoryEntryStore::new());
    let pipeline = pipeline(&root, store.clone(), Arc::new(LocalBlobStorage::new(&root)));
    let ct = CancellationToken::new();
    pipeline.commit(pipeline.stage_all([&path], &ct).unwrap(), &ct).unwrap();
    let before: Vec<Entry> = store.enumerate_all().unwrap().collect();

    let staged = pipeline.stage_all([&path], &ct).unwrap();
    assert_eq!(staged[0].suggested_action, SuggestedAction::Duplicate);
    assert_eq!(staged[0].similarity, 1.0);
    assert!(!staged[0].selected);

    // Even if the user selects it, a duplicate is never committed
    let mut forced = staged;
    forced[0].selected = true;
    assert!(pipeline.commit(forced, &ct).unwrap().is_empty());

    let after: Vec<Entry> = store.enumerate_all().unwrap().collect();
    assert_eq!(before, after);
}

#[test]
fn attachment_targets_entry_created_in_same_call() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("root");
    let inbox = temp_dir.path().join("inbox");
    let store = Arc::new(InMemoryEntryStore::new());
    let pipeline = pipeline(&root, store.clone(), Arc::new(LocalBlobStorage::new(&root)));

    let mut paper = StagingItem::new(write(&inbox, "paper.pdf", b"main paper"));
    paper.title = "Paper A".to_string();
    let mut supplement = StagingItem::new(write(&inbox, "supp.xlsx.txt", b"supplementary table"));
    supplement.suggested_action = SuggestedAction::Attachment;
    supplement.similar_to_title = Some("Paper A".to_string());

    assert_eq!(store.count().unwrap(), 0);
    let committed = pipeline
        .commit(vec![supplement, paper], &CancellationToken::new())
        .unwrap();

    assert_eq!(committed.len(), 2);
    let entries: Vec<Entry> = store.enumerate_all().unwrap().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, "Paper A");
    assert_eq!(entries[0].attachments.len(), 1);
    assert_eq!(entries[0].attachments[0].added_by, "integration");
    assert!(root.join(&entries[0].attachments[0].relative_path).is_file());
}

/// Refuses to store one named source file
struct FailingStorage {
    inner: LocalBlobStorage,
    reject: String,
}

impl BlobStorage for FailingStorage {
    fn copy_into_storage(
        &self,
        source: &Path,
        area: StorageArea,
        preferred_name: &str,
    ) -> Result<PathBuf, StorageError> {
        if source.file_name().is_some_and(|n| n == self.reject.as_str()) {
            return Err(StorageError::CopyFailed {
                source_path: source.to_path_buf(),
                target: PathBuf::from(preferred_name),
                source: std::io::Error::other("disk full"),
            });
        }
        self.inner.copy_into_storage(source, area, preferred_name)
    }

    fn absolute_path(&self, relative: &Path) -> PathBuf {
        self.inner.absolute_path(relative)
    }
}

#[test]
fn one_failed_copy_does_not_block_either_pass() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("root");
    let inbox = temp_dir.path().join("inbox");
    let store = Arc::new(InMemoryEntryStore::new());
    let storage = Arc::new(FailingStorage {
        inner: LocalBlobStorage::new(&root),
        reject: "broken.pdf".to_string(),
    });
    let pipeline = pipeline(&root, store.clone(), storage);

    let mut first = StagingItem::new(write(&inbox, "first.pdf", b"first"));
    first.title = "First".to_string();
    let broken = StagingItem::new(write(&inbox, "broken.pdf", b"broken"));
    let last = StagingItem::new(write(&inbox, "last.pdf", b"last"));
    let mut notes = StagingItem::new(write(&inbox, "notes.md", b"# Notes"));
    notes.suggested_action = SuggestedAction::Attachment;
    notes.similar_to_title = Some("First".to_string());

    let committed = pipeline
        .commit(vec![first, broken, last, notes], &CancellationToken::new())
        .unwrap();

    let names: Vec<_> = committed
        .iter()
        .map(|i| i.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["first.pdf", "last.pdf", "notes.md"]);
    assert_eq!(store.count().unwrap(), 2);
}

#[test]
fn changelog_records_every_commit() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("root");
    let inbox = temp_dir.path().join("inbox");
    let changelog = Arc::new(ChangeLogRepository::open(&root.join("changelog.db")).unwrap());
    let store = Arc::new(InMemoryEntryStore::new());

    let pipeline = IntakePipeline::builder()
        .store(store.clone())
        .storage(Arc::new(LocalBlobStorage::new(&root)))
        .hasher(Arc::new(Sha256Hasher::new()))
        .extractor(Arc::new(FilenameExtractor::new()))
        .scorer(Arc::new(ShingleScorer::new()))
        .hook(changelog.clone())
        .build()
        .unwrap();

    let existing = {
        let mut entry = Entry {
            title: "Original".to_string(),
            ..Entry::default()
        };
        store.save(&mut entry).unwrap()
    };

    let mut version = StagingItem::new(write(&inbox, "v2.pdf", b"second edition"));
    version.suggested_action = SuggestedAction::Version;
    version.target_entry_id = Some(existing.clone());

    pipeline
        .commit(vec![version], &CancellationToken::new())
        .unwrap();

    let events = changelog.recent(10).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, ChangeLogAction::Version);

    let created = store
        .enumerate_all()
        .unwrap()
        .find(|e| e.id.as_deref() != Some(existing.as_str()))
        .unwrap();
    assert_eq!(created.relation_tags, vec![format!("rel:version-of:{}", existing)]);
    assert_eq!(Some(events[0].entry_id.clone()), created.id);
}

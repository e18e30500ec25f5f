//! Stub services shared by the pipeline unit tests.

use super::Services;
use crate::core::hasher::Sha256Hasher;
use crate::core::metadata::FilenameExtractor;
use crate::core::model::Entry;
use crate::core::similarity::SimilarityScorer;
use crate::core::storage::LocalBlobStorage;
use crate::core::store::{EntryStore, InMemoryEntryStore};
use crate::error::ScoreError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Scores by candidate file name and counts every call
#[derive(Default)]
pub struct TableScorer {
    scores: HashMap<String, f64>,
    failing: Vec<String>,
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<String>>,
}

impl TableScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score_for(mut self, candidate_name: &str, score: f64) -> Self {
        self.scores.insert(candidate_name.to_string(), score);
        self
    }

    pub fn fail_for(mut self, candidate_name: &str) -> Self {
        self.failing.push(candidate_name.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SimilarityScorer for TableScorer {
    fn score(&self, _source: &Path, candidate: &Path) -> Result<f64, ScoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = candidate
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.seen.lock().unwrap().push(name.clone());

        if self.failing.contains(&name) {
            return Err(ScoreError::Failed {
                path: candidate.to_path_buf(),
                reason: "stub failure".to_string(),
            });
        }
        Ok(self.scores.get(&name).copied().unwrap_or(0.0))
    }
}

/// A library root plus in-memory store
pub struct Fixture {
    pub dir: TempDir,
    pub store: Arc<InMemoryEntryStore>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            store: Arc::new(InMemoryEntryStore::new()),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write an incoming file outside the library area
    pub fn incoming(&self, name: &str, content: &[u8]) -> PathBuf {
        let inbox = self.root().join("inbox");
        std::fs::create_dir_all(&inbox).unwrap();
        let path = inbox.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Store an entry whose main file exists under `library/<file_name>`
    pub fn stored_entry(
        &self,
        title: &str,
        year: Option<i32>,
        file_name: &str,
        hash: &str,
    ) -> Entry {
        let library = self.root().join("library");
        std::fs::create_dir_all(&library).unwrap();
        std::fs::write(library.join(file_name), title.as_bytes()).unwrap();

        let mut entry = Entry {
            title: title.to_string(),
            display_name: title.to_string(),
            year,
            main_file: PathBuf::from("library").join(file_name),
            main_file_hash_sha256: hash.to_string(),
            ..Entry::default()
        };
        self.store.save(&mut entry).unwrap();
        entry
    }

    pub fn services(&self, scorer: Arc<dyn SimilarityScorer>) -> Services {
        Services::new(
            self.store.clone(),
            Arc::new(LocalBlobStorage::new(self.root())),
            Arc::new(Sha256Hasher::new()),
            Arc::new(FilenameExtractor::new()),
            scorer,
        )
    }
}

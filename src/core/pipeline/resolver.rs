//! Fingerprint resolution: hash, then identifiers, then content similarity.

use super::{CancellationToken, Services};
use crate::core::model::{is_duplicate_score, Entry, ExtractedMeta, ItemType, Match, NEAR_THRESHOLD};
use crate::error::StagingError;
use std::collections::HashSet;
use std::path::Path;

/// Classifies one file against the library.
///
/// Each step short-circuits on a confident result:
/// 1. content digest already stored -> `Hash`
/// 2. PDF with a DOI/PMID known to the store -> `IdExact`
/// 3. best content-similarity candidate, narrow name/year probe first,
///    then a full scan that stops at the first confirmed duplicate
pub struct FingerprintResolver<'a> {
    services: &'a Services,
}

/// Best content candidate seen so far
#[derive(Default)]
struct Best {
    candidate: Option<(String, String)>,
    score: f64,
}

impl Best {
    fn offer(&mut self, entry: &Entry, id: &str, score: f64) {
        if score > self.score {
            self.score = score;
            self.candidate = Some((id.to_string(), entry.display_title().to_string()));
        }
    }

    fn is_duplicate(&self) -> bool {
        is_duplicate_score(self.score)
    }

    fn into_match(self) -> Match {
        match self.candidate {
            Some((id, title)) => Match::content(id, title, self.score),
            None => Match::none(),
        }
    }
}

impl<'a> FingerprintResolver<'a> {
    pub fn new(services: &'a Services) -> Self {
        Self { services }
    }

    /// Resolve `path` (with its normalized metadata) to a [`Match`]
    pub fn resolve(
        &self,
        path: &Path,
        meta: &ExtractedMeta,
        ct: &CancellationToken,
    ) -> Result<Match, StagingError> {
        ct.check()?;
        let hash = self.services.hasher.compute_hash(path)?;

        ct.check()?;
        if let Some(entry) = self.services.store.find_by_hash(&hash)? {
            tracing::debug!(path = %path.display(), hash = %hash, "Content digest already stored");
            return Ok(Match::hash(&entry));
        }

        if let Some(found) = self.identifier_match(path, meta, ct)? {
            return Ok(found);
        }

        self.content_match(path, meta, ct)
    }

    fn identifier_match(
        &self,
        path: &Path,
        meta: &ExtractedMeta,
        ct: &CancellationToken,
    ) -> Result<Option<Match>, StagingError> {
        if ItemType::from_path(path) != ItemType::Publication || !meta.has_identifiers() {
            return Ok(None);
        }

        ct.check()?;
        match self
            .services
            .store
            .find_by_identifiers(meta.doi.as_deref(), meta.pmid.as_deref())
        {
            Ok(Some(entry)) => {
                tracing::debug!(path = %path.display(), "Identifier already stored");
                Ok(Some(Match::identifier(&entry)))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                tracing::debug!(
                    path = %path.display(),
                    error = %e,
                    "Identifier lookup unavailable"
                );
                Ok(None)
            }
        }
    }

    fn content_match(
        &self,
        path: &Path,
        meta: &ExtractedMeta,
        ct: &CancellationToken,
    ) -> Result<Match, StagingError> {
        let mut best = Best::default();
        let mut compared = HashSet::new();

        if let Some(title) = meta.clean_title() {
            ct.check()?;
            let narrow = match self.services.store.find_similar_by_name_year(title, meta.year) {
                Ok(candidates) => candidates,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Name/year probe failed");
                    Vec::new()
                }
            };

            for candidate in &narrow {
                self.consider(path, candidate, &mut best, &mut compared, ct)?;
                if best.is_duplicate() {
                    return Ok(best.into_match());
                }
            }

            // Near-matches from the narrow probe are trusted as-is
            if best.score >= NEAR_THRESHOLD {
                return Ok(best.into_match());
            }
        }

        ct.check()?;
        for candidate in self.services.store.enumerate_all()? {
            if candidate.id.as_ref().is_some_and(|id| compared.contains(id)) {
                continue;
            }
            self.consider(path, &candidate, &mut best, &mut compared, ct)?;
            if best.is_duplicate() {
                break;
            }
        }

        Ok(best.into_match())
    }

    /// Score one candidate. Missing files and scorer failures are skipped.
    fn consider(
        &self,
        path: &Path,
        candidate: &Entry,
        best: &mut Best,
        compared: &mut HashSet<String>,
        ct: &CancellationToken,
    ) -> Result<(), StagingError> {
        let Some(id) = candidate.id.as_deref() else {
            return Ok(());
        };
        if !compared.insert(id.to_string()) {
            return Ok(());
        }
        if candidate.main_file.as_os_str().is_empty() {
            return Ok(());
        }

        let absolute = self.services.storage.absolute_path(&candidate.main_file);
        if !absolute.is_file() {
            tracing::debug!(
                entry_id = %id,
                path = %absolute.display(),
                "Candidate file missing, skipped"
            );
            return Ok(());
        }

        ct.check()?;
        match self.services.scorer.score(path, &absolute) {
            Ok(score) => best.offer(candidate, id, score),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    entry_id = %id,
                    error = %e,
                    "Similarity scoring failed"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hasher::{ContentHasher, Sha256Hasher};
    use crate::core::model::MatchKind;
    use crate::core::pipeline::test_support::{Fixture, TableScorer};
    use crate::core::store::{EntryIter, EntryStore};
    use crate::error::StoreError;
    use std::sync::Arc;

    fn meta(title: Option<&str>, year: Option<i32>) -> ExtractedMeta {
        ExtractedMeta {
            title: title.map(String::from),
            year,
            ..ExtractedMeta::default()
        }
    }

    #[test]
    fn stored_digest_is_a_hash_match() {
        let fx = Fixture::new();
        let path = fx.incoming("paper.pdf", b"same bytes");
        let hash = Sha256Hasher::new().compute_hash(&path).unwrap();
        let entry = fx.stored_entry("Stored Paper", Some(2020), "stored.pdf", &hash);

        let scorer = Arc::new(TableScorer::new());
        let services = fx.services(scorer.clone());
        let found = FingerprintResolver::new(&services)
            .resolve(&path, &meta(Some("Anything"), None), &CancellationToken::new())
            .unwrap();

        assert_eq!(found.kind, MatchKind::Hash);
        assert_eq!(found.score, 1.0);
        assert_eq!(found.entry_id, entry.id);
        assert_eq!(scorer.calls(), 0);
    }

    #[test]
    fn identifier_match_only_for_pdfs() {
        let fx = Fixture::new();
        let mut entry = fx.stored_entry("Indexed", None, "indexed.pdf", "h1");
        entry.doi = Some("10.1000/xyz".to_string());
        fx.store.save(&mut entry).unwrap();

        let services = fx.services(Arc::new(TableScorer::new()));
        let resolver = FingerprintResolver::new(&services);
        let mut with_doi = meta(None, None);
        with_doi.doi = Some("10.1000/xyz".to_string());

        let pdf = fx.incoming("a.pdf", b"pdf bytes");
        let found = resolver.resolve(&pdf, &with_doi, &CancellationToken::new()).unwrap();
        assert_eq!(found.kind, MatchKind::IdExact);

        let docx = fx.incoming("a.docx", b"docx bytes");
        let found = resolver.resolve(&docx, &with_doi, &CancellationToken::new()).unwrap();
        assert_eq!(found.kind, MatchKind::None);
    }

    #[test]
    fn narrow_near_match_skips_full_scan() {
        let fx = Fixture::new();
        fx.stored_entry("Graph Neural Networks", Some(2021), "gnn.pdf", "h1");
        fx.stored_entry("Unrelated Topic", Some(2019), "other.pdf", "h2");

        let scorer = Arc::new(
            TableScorer::new()
                .score_for("gnn.pdf", 0.8)
                .score_for("other.pdf", 0.9),
        );
        let services = fx.services(scorer.clone());
        let path = fx.incoming("new.pdf", b"new bytes");

        let found = FingerprintResolver::new(&services)
            .resolve(
                &path,
                &meta(Some("Graph Neural Networks"), Some(2021)),
                &CancellationToken::new(),
            )
            .unwrap();

        assert_eq!(found.kind, MatchKind::Content);
        assert_eq!(found.score, 0.8);
        assert_eq!(found.title.as_deref(), Some("Graph Neural Networks"));
        assert_eq!(scorer.calls(), 1);
    }

    #[test]
    fn weak_narrow_result_falls_through_without_rescoring() {
        let fx = Fixture::new();
        fx.stored_entry("Graph Neural Networks", Some(2021), "gnn.pdf", "h1");
        fx.stored_entry("Unrelated Topic", Some(2019), "other.pdf", "h2");

        let scorer = Arc::new(
            TableScorer::new()
                .score_for("gnn.pdf", 0.3)
                .score_for("other.pdf", 0.9),
        );
        let services = fx.services(scorer.clone());
        let path = fx.incoming("new.pdf", b"new bytes");

        let found = FingerprintResolver::new(&services)
            .resolve(
                &path,
                &meta(Some("Graph Neural Networks"), Some(2021)),
                &CancellationToken::new(),
            )
            .unwrap();

        assert_eq!(found.title.as_deref(), Some("Unrelated Topic"));
        assert_eq!(found.score, 0.9);
        assert_eq!(*scorer.seen.lock().unwrap(), vec!["gnn.pdf", "other.pdf"]);
    }

    #[test]
    fn full_scan_stops_at_first_duplicate() {
        let fx = Fixture::new();
        for i in 0..5 {
            let title = format!("Entry {}", i);
            fx.stored_entry(&title, None, &format!("e{}.pdf", i), &format!("h{}", i));
        }

        let scorer = Arc::new(
            TableScorer::new()
                .score_for("e1.pdf", 0.999)
                .score_for("e3.pdf", 1.0),
        );
        let services = fx.services(scorer.clone());
        let path = fx.incoming("new.pdf", b"new bytes");

        let found = FingerprintResolver::new(&services)
            .resolve(&path, &meta(None, None), &CancellationToken::new())
            .unwrap();

        assert!(found.is_duplicate());
        assert_eq!(found.title.as_deref(), Some("Entry 1"));
        assert_eq!(scorer.calls(), 2);
    }

    #[test]
    fn scorer_failure_skips_one_candidate() {
        let fx = Fixture::new();
        fx.stored_entry("First", None, "first.pdf", "h1");
        fx.stored_entry("Second", None, "second.pdf", "h2");

        let scorer = Arc::new(
            TableScorer::new()
                .fail_for("first.pdf")
                .score_for("second.pdf", 0.5),
        );
        let services = fx.services(scorer.clone());
        let path = fx.incoming("new.pdf", b"new bytes");

        let found = FingerprintResolver::new(&services)
            .resolve(&path, &meta(None, None), &CancellationToken::new())
            .unwrap();

        assert_eq!(found.title.as_deref(), Some("Second"));
        assert_eq!(found.score, 0.5);
        assert_eq!(scorer.calls(), 2);
    }

    #[test]
    fn missing_candidate_files_are_not_scored() {
        let fx = Fixture::new();
        let mut ghost = Entry {
            title: "Ghost".to_string(),
            main_file: "library/ghost.pdf".into(),
            ..Entry::default()
        };
        fx.store.save(&mut ghost).unwrap();

        let scorer = Arc::new(TableScorer::new());
        let services = fx.services(scorer.clone());
        let path = fx.incoming("new.pdf", b"new bytes");

        let found = FingerprintResolver::new(&services)
            .resolve(&path, &meta(Some("Ghost"), None), &CancellationToken::new())
            .unwrap();

        assert_eq!(found, Match::none());
        assert_eq!(scorer.calls(), 0);
    }

    #[test]
    fn empty_store_yields_no_match() {
        let fx = Fixture::new();
        let services = fx.services(Arc::new(TableScorer::new()));
        let path = fx.incoming("new.pdf", b"new bytes");

        let found = FingerprintResolver::new(&services)
            .resolve(&path, &meta(Some("Anything"), None), &CancellationToken::new())
            .unwrap();

        assert_eq!(found.kind, MatchKind::None);
        assert_eq!(found.score, 0.0);
    }

    #[test]
    fn cancelled_token_stops_resolution() {
        let fx = Fixture::new();
        let services = fx.services(Arc::new(TableScorer::new()));
        let path = fx.incoming("new.pdf", b"new bytes");
        let ct = CancellationToken::new();
        ct.cancel();

        let result = FingerprintResolver::new(&services).resolve(&path, &meta(None, None), &ct);
        assert!(matches!(result, Err(StagingError::Cancelled)));
    }

    /// Store with no name index; every probe fails
    struct ProbeFailingStore(crate::core::store::InMemoryEntryStore);

    impl EntryStore for ProbeFailingStore {
        fn find_by_id(&self, id: &str) -> Result<Option<Entry>, StoreError> {
            self.0.find_by_id(id)
        }
        fn find_by_hash(&self, hash: &str) -> Result<Option<Entry>, StoreError> {
            self.0.find_by_hash(hash)
        }
        fn find_similar_by_name_year(
            &self,
            _: &str,
            _: Option<i32>,
        ) -> Result<Vec<Entry>, StoreError> {
            Err(StoreError::QueryFailed("no index".to_string()))
        }
        fn enumerate_all(&self) -> Result<EntryIter<'_>, StoreError> {
            self.0.enumerate_all()
        }
        fn save(&self, entry: &mut Entry) -> Result<String, StoreError> {
            self.0.save(entry)
        }
    }

    #[test]
    fn failed_probe_and_missing_identifier_index_fall_back_to_scan() {
        let fx = Fixture::new();
        let stored = fx.stored_entry("Kept", None, "kept.pdf", "h1");
        let inner = crate::core::store::InMemoryEntryStore::with_entries(vec![stored]);

        let scorer = Arc::new(TableScorer::new().score_for("kept.pdf", 0.6));
        let mut services = fx.services(scorer.clone());
        services.store = Arc::new(ProbeFailingStore(inner));

        let mut with_doi = meta(Some("Kept"), None);
        with_doi.doi = Some("10.1/x".to_string());
        let path = fx.incoming("new.pdf", b"new bytes");

        let found = FingerprintResolver::new(&services)
            .resolve(&path, &with_doi, &CancellationToken::new())
            .unwrap();

        assert_eq!(found.kind, MatchKind::Content);
        assert_eq!(found.score, 0.6);
    }
}

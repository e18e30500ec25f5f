//! The bundle of collaborators the pipeline consumes.

use crate::core::hasher::ContentHasher;
use crate::core::hooks::CommitHook;
use crate::core::metadata::{
    EvidenceExtractor, IdentifierNormalizer, MetadataExtractor, PublicationLookup, TrimNormalizer,
};
use crate::core::similarity::SimilarityScorer;
use crate::core::storage::BlobStorage;
use crate::core::store::EntryStore;
use std::sync::Arc;

/// Shared service handles.
///
/// Cloning is cheap; staging workers each hold a clone.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn EntryStore>,
    pub storage: Arc<dyn BlobStorage>,
    pub hasher: Arc<dyn ContentHasher>,
    pub extractor: Arc<dyn MetadataExtractor>,
    pub scorer: Arc<dyn SimilarityScorer>,
    /// Defaults to [`TrimNormalizer`]
    pub normalizer: Arc<dyn IdentifierNormalizer>,
    pub lookup: Option<Arc<dyn PublicationLookup>>,
    pub evidence: Option<Arc<dyn EvidenceExtractor>>,
    pub hooks: Vec<Arc<dyn CommitHook>>,
}

impl Services {
    /// Required services only; optional ones keep their pass-through defaults
    pub fn new(
        store: Arc<dyn EntryStore>,
        storage: Arc<dyn BlobStorage>,
        hasher: Arc<dyn ContentHasher>,
        extractor: Arc<dyn MetadataExtractor>,
        scorer: Arc<dyn SimilarityScorer>,
    ) -> Self {
        Self {
            store,
            storage,
            hasher,
            extractor,
            scorer,
            normalizer: Arc::new(TrimNormalizer),
            lookup: None,
            evidence: None,
            hooks: Vec::new(),
        }
    }
}

//! Pipeline facade: wires services and config, then stages and commits.

use super::{
    CancellationToken, IntakeConfig, Services, StagedBatches, StagingScheduler, TwoPhaseCommitter,
};
use crate::core::hasher::ContentHasher;
use crate::core::hooks::CommitHook;
use crate::core::metadata::{
    EvidenceExtractor, IdentifierNormalizer, MetadataExtractor, PublicationLookup,
};
use crate::core::model::StagingItem;
use crate::core::similarity::SimilarityScorer;
use crate::core::storage::BlobStorage;
use crate::core::store::EntryStore;
use crate::error::IntakeError;
use crate::events::{null_sender, EventSender};
use std::path::Path;
use std::sync::Arc;

/// Builder for [`IntakePipeline`]
#[derive(Default)]
pub struct IntakePipelineBuilder {
    config: IntakeConfig,
    store: Option<Arc<dyn EntryStore>>,
    storage: Option<Arc<dyn BlobStorage>>,
    hasher: Option<Arc<dyn ContentHasher>>,
    extractor: Option<Arc<dyn MetadataExtractor>>,
    scorer: Option<Arc<dyn SimilarityScorer>>,
    normalizer: Option<Arc<dyn IdentifierNormalizer>>,
    lookup: Option<Arc<dyn PublicationLookup>>,
    evidence: Option<Arc<dyn EvidenceExtractor>>,
    hooks: Vec<Arc<dyn CommitHook>>,
    events: Option<EventSender>,
}

impl IntakePipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: IntakeConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the staging window
    pub fn max_parallelism(mut self, window: usize) -> Self {
        self.config.max_parallelism = Some(window);
        self
    }

    pub fn store(mut self, store: Arc<dyn EntryStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn storage(mut self, storage: Arc<dyn BlobStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn hasher(mut self, hasher: Arc<dyn ContentHasher>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn MetadataExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn scorer(mut self, scorer: Arc<dyn SimilarityScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    /// Defaults to trimming
    pub fn normalizer(mut self, normalizer: Arc<dyn IdentifierNormalizer>) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    /// Defaults to no lookup
    pub fn publication_lookup(mut self, lookup: Arc<dyn PublicationLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Defaults to no enrichment
    pub fn evidence_extractor(mut self, evidence: Arc<dyn EvidenceExtractor>) -> Self {
        self.evidence = Some(evidence);
        self
    }

    pub fn hook(mut self, hook: Arc<dyn CommitHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Fails when a required service is missing
    pub fn build(self) -> Result<IntakePipeline, IntakeError> {
        fn required<T>(service: Option<T>, name: &str) -> Result<T, IntakeError> {
            service.ok_or_else(|| IntakeError::Config(format!("missing {}", name)))
        }

        let mut services = Services::new(
            required(self.store, "entry store")?,
            required(self.storage, "blob storage")?,
            required(self.hasher, "content hasher")?,
            required(self.extractor, "metadata extractor")?,
            required(self.scorer, "similarity scorer")?,
        );
        if let Some(normalizer) = self.normalizer {
            services.normalizer = normalizer;
        }
        services.lookup = self.lookup;
        services.evidence = self.evidence;
        services.hooks = self.hooks;

        Ok(IntakePipeline {
            services: Arc::new(services),
            config: self.config,
            events: self.events.unwrap_or_else(null_sender),
        })
    }
}

/// Stages files and commits accepted items
pub struct IntakePipeline {
    services: Arc<Services>,
    config: IntakeConfig,
    events: EventSender,
}

impl IntakePipeline {
    pub fn builder() -> IntakePipelineBuilder {
        IntakePipelineBuilder::new()
    }

    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Ordered, lazily published staging stream
    pub fn stage<I, P>(
        &self,
        paths: I,
        ct: &CancellationToken,
    ) -> Result<StagedBatches, IntakeError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        StagingScheduler::new(self.services.clone(), self.config.staging_window())
            .with_events(self.events.clone())
            .stage_all(paths, ct)
    }

    /// Stage everything and collect the ordered list
    pub fn stage_all<I, P>(
        &self,
        paths: I,
        ct: &CancellationToken,
    ) -> Result<Vec<StagingItem>, IntakeError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.stage(paths, ct)?.collect_items()
    }

    /// Commit accepted items; returns the committed subset
    pub fn commit(
        &self,
        items: Vec<StagingItem>,
        ct: &CancellationToken,
    ) -> Result<Vec<StagingItem>, IntakeError> {
        TwoPhaseCommitter::new(&self.services, self.config.added_by.clone())
            .with_events(self.events.clone())
            .commit(items, ct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::test_support::{Fixture, TableScorer};
    use crate::core::model::{MatchKind, SuggestedAction};

    fn pipeline(fx: &Fixture) -> IntakePipeline {
        let services = fx.services(Arc::new(TableScorer::new()));
        IntakePipeline::builder()
            .store(services.store)
            .storage(services.storage)
            .hasher(services.hasher)
            .extractor(services.extractor)
            .scorer(services.scorer)
            .max_parallelism(2)
            .build()
            .unwrap()
    }

    #[test]
    fn build_requires_core_services() {
        let result = IntakePipeline::builder().build();
        assert!(matches!(result, Err(IntakeError::Config(msg)) if msg.contains("entry store")));
    }

    #[test]
    fn window_follows_config() {
        let fx = Fixture::new();
        assert_eq!(pipeline(&fx).config().staging_window(), 2);
    }

    #[test]
    fn restaging_committed_file_is_hash_duplicate() {
        let fx = Fixture::new();
        let pipeline = pipeline(&fx);
        let path = fx.incoming("paper.pdf", b"paper body");
        let ct = CancellationToken::new();

        let first = pipeline.stage_all([&path], &ct).unwrap();
        assert_eq!(first[0].suggested_action, SuggestedAction::New);
        pipeline.commit(first, &ct).unwrap();

        let second = pipeline.stage_all([&path], &ct).unwrap();
        assert_eq!(second[0].match_kind, MatchKind::Hash);
        assert_eq!(second[0].similarity, 1.0);
        assert!(!second[0].selected);
    }
}

//! Concurrent staging with ordered publication.
//!
//! Files are staged on a bounded rayon pool. Results arrive in completion
//! order, are buffered by sequence index, and the longest ready prefix is
//! published as one batch, so consumers always see lexicographic path
//! order without waiting for the whole run.

use super::{CancellationToken, FingerprintResolver, Services, StagingAssembler};
use crate::core::model::{ExtractedMeta, ItemType, PublicationRecord, StagingItem, SuggestedAction};
use crate::error::{IntakeError, StagingError};
use crate::events::{null_sender, EventSender, StageEvent};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::{BTreeMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

/// One published element of the staging stream
pub type StagedBatch = Result<Vec<StagingItem>, IntakeError>;

/// Drop blank and missing paths, dedupe case-insensitively (first wins),
/// then sort lexicographically. The position in the result is the
/// sequence index used for ordered publication.
pub fn normalize_inputs<I, P>(paths: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut seen = HashSet::new();
    let mut kept: Vec<PathBuf> = paths
        .into_iter()
        .filter_map(|p| {
            let raw = p.as_ref().to_string_lossy();
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return None;
            }
            let path = PathBuf::from(trimmed);
            (path.exists() && seen.insert(trimmed.to_lowercase())).then_some(path)
        })
        .collect();

    kept.sort_by(|a, b| a.to_string_lossy().cmp(&b.to_string_lossy()));
    kept
}

/// Stage a single file: extract, normalize identifiers, resolve, look up,
/// assemble, and enrich.
///
/// Lookup and evidence failures are swallowed; everything else fails the
/// file.
pub fn stage_file(
    services: &Services,
    path: &Path,
    ct: &CancellationToken,
) -> Result<StagingItem, StagingError> {
    ct.check()?;
    let mut meta = services.extractor.extract(path)?;
    normalize_identifiers(services, &mut meta);

    let found = FingerprintResolver::new(services).resolve(path, &meta, ct)?;
    let publication = lookup_publication(services, &meta, ct)?;
    let mut item = StagingAssembler::new().assemble(path, &meta, publication, &found);

    if item.item_type == ItemType::Publication
        && item.suggested_action != SuggestedAction::Duplicate
    {
        if let Some(evidence) = &services.evidence {
            ct.check()?;
            match evidence.extract_evidence(path) {
                Ok(payload) => item.enrichment = payload,
                Err(e) => {
                    tracing::debug!(
                        path = %path.display(),
                        error = %e,
                        "Evidence extraction skipped"
                    );
                }
            }
        }
    }

    Ok(item)
}

fn normalize_identifiers(services: &Services, meta: &mut ExtractedMeta) {
    meta.doi = meta
        .doi
        .as_deref()
        .and_then(|d| services.normalizer.normalize_doi(d));
    meta.pmid = meta
        .pmid
        .as_deref()
        .and_then(|p| services.normalizer.normalize_pmid(p));
}

fn lookup_publication(
    services: &Services,
    meta: &ExtractedMeta,
    ct: &CancellationToken,
) -> Result<Option<PublicationRecord>, StagingError> {
    let (Some(lookup), Some(doi)) = (&services.lookup, meta.doi.as_deref()) else {
        return Ok(None);
    };

    ct.check()?;
    match lookup.lookup_doi(doi) {
        Ok(record) => Ok(record),
        Err(e) => {
            tracing::debug!(
                doi = %doi,
                error = %e,
                "Publication lookup failed, using local metadata"
            );
            Ok(None)
        }
    }
}

/// Runs [`stage_file`] over many paths with a bounded window
pub struct StagingScheduler {
    services: Arc<Services>,
    window: usize,
    events: EventSender,
}

impl StagingScheduler {
    pub fn new(services: Arc<Services>, window: usize) -> Self {
        Self {
            services,
            window: window.max(1),
            events: null_sender(),
        }
    }

    /// Report progress on this channel
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = events;
        self
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Start staging in the background and return the ordered stream.
    pub fn stage_all<I, P>(
        &self,
        paths: I,
        ct: &CancellationToken,
    ) -> Result<StagedBatches, IntakeError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let paths = normalize_inputs(paths);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.window)
            .thread_name(|i| format!("intake-stage-{}", i))
            .build()
            .map_err(|e| IntakeError::Config(format!("staging pool: {}", e)))?;

        let (out_tx, out_rx) = unbounded();
        let coordinator = Coordinator {
            services: self.services.clone(),
            window: self.window,
            events: self.events.clone(),
            ct: ct.clone(),
            out: out_tx,
        };

        let handle = std::thread::Builder::new()
            .name("intake-coordinator".to_string())
            .spawn(move || coordinator.run(pool, paths))
            .map_err(|e| IntakeError::Config(format!("staging coordinator: {}", e)))?;

        Ok(StagedBatches {
            rx: out_rx,
            handle: Some(handle),
        })
    }
}

struct Coordinator {
    services: Arc<Services>,
    window: usize,
    events: EventSender,
    ct: CancellationToken,
    out: Sender<StagedBatch>,
}

impl Coordinator {
    fn run(self, pool: rayon::ThreadPool, paths: Vec<PathBuf>) {
        let total = paths.len();
        self.events.stage(StageEvent::Started { total });

        let (done_tx, done_rx) = unbounded::<(usize, Result<StagingItem, StagingError>)>();
        let mut pending: BTreeMap<usize, Option<StagingItem>> = BTreeMap::new();
        let mut next_launch = 0;
        let mut next_emit = 0;
        let mut in_flight = 0;
        let mut staged = 0;
        let mut failed = 0;

        loop {
            while in_flight < self.window && next_launch < total && !self.ct.is_cancelled() {
                let index = next_launch;
                let path = paths[index].clone();
                let services = self.services.clone();
                let ct = self.ct.clone();
                let done = done_tx.clone();

                pool.spawn(move || {
                    let outcome =
                        catch_unwind(AssertUnwindSafe(|| stage_file(&services, &path, &ct)))
                            .unwrap_or_else(|_| Err(StagingError::Panicked { path: path.clone() }));
                    let _ = done.send((index, outcome));
                });

                next_launch += 1;
                in_flight += 1;
            }

            if in_flight == 0 {
                break;
            }

            let Ok((index, outcome)) = done_rx.recv() else {
                break;
            };
            in_flight -= 1;

            let item = match outcome {
                Ok(item) => Some(item),
                Err(StagingError::Cancelled) => None,
                Err(e) => {
                    failed += 1;
                    tracing::warn!(
                        path = %paths[index].display(),
                        error = %e,
                        "Failed to stage file"
                    );
                    self.events.stage(StageEvent::FileFailed {
                        path: paths[index].clone(),
                        message: e.to_string(),
                    });
                    None
                }
            };
            pending.insert(index, item);

            if self.ct.is_cancelled() {
                break;
            }

            let mut batch = Vec::new();
            while let Some(item) = pending.remove(&next_emit) {
                if let Some(item) = item {
                    self.events.stage(StageEvent::FileStaged {
                        index: next_emit,
                        path: item.path.clone(),
                        action: item.suggested_action,
                    });
                    batch.push(item);
                }
                next_emit += 1;
            }

            if !batch.is_empty() {
                staged += batch.len();
                self.events.stage(StageEvent::BatchPublished {
                    count: batch.len(),
                    next_index: next_emit,
                });
                if self.out.send(Ok(batch)).is_err() {
                    tracing::debug!("Staging stream dropped by consumer");
                    return;
                }
            }
        }

        if self.ct.is_cancelled() {
            tracing::info!(staged, "Staging cancelled");
            self.events.stage(StageEvent::Cancelled);
            let _ = self.out.send(Err(IntakeError::Cancelled));
            return;
        }

        tracing::info!(staged, failed, "Staging completed");
        self.events.stage(StageEvent::Completed { staged, failed });
    }
}

/// Ordered stream of staged batches.
///
/// Ends after the last batch, or after a single `Err(Cancelled)`.
pub struct StagedBatches {
    rx: Receiver<StagedBatch>,
    handle: Option<JoinHandle<()>>,
}

impl StagedBatches {
    /// Drain the stream into one ordered list
    pub fn collect_items(self) -> Result<Vec<StagingItem>, IntakeError> {
        let mut items = Vec::new();
        for batch in self {
            items.extend(batch?);
        }
        Ok(items)
    }
}

impl Iterator for StagedBatches {
    type Item = StagedBatch;

    fn next(&mut self) -> Option<Self::Item> {
        match self.rx.recv() {
            Ok(batch) => Some(batch),
            Err(_) => {
                if let Some(handle) = self.handle.take() {
                    let _ = handle.join();
                }
                None
            }
        }
    }
}

//! Two-pass commit of accepted staging items.
//!
//! Pass 1 creates entries (New, Review, Variant, Version) and records
//! their ids under their titles. Pass 2 appends attachments, resolving
//! targets by explicit id or through titles created in pass 1. Passes run
//! sequentially and items are committed one at a time.

use super::{CancellationToken, Services};
use crate::core::hooks::HookContextBuilder;
use crate::core::model::{
    normalize_title, Attachment, Entry, Relation, StagingItem, SuggestedAction,
};
use crate::core::storage::StorageArea;
use crate::error::{CommitError, IntakeError};
use crate::events::{null_sender, CommitEvent, CommitPass, CommitSummary, EventSender};
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Titles created in this commit call, keyed by normalized title
type TitleMap = HashMap<String, String>;

/// What one successful item produced
struct Committed {
    entry_id: String,
    stored_path: PathBuf,
    hash: String,
}

/// Persists accepted staging items
pub struct TwoPhaseCommitter<'a> {
    services: &'a Services,
    added_by: String,
    events: EventSender,
}

impl<'a> TwoPhaseCommitter<'a> {
    pub fn new(services: &'a Services, added_by: impl Into<String>) -> Self {
        Self {
            services,
            added_by: added_by.into(),
            events: null_sender(),
        }
    }

    /// Report progress on this channel
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = events;
        self
    }

    /// Commit the selected items and return those that were persisted.
    ///
    /// Per-item failures are logged and skipped; only cancellation is
    /// returned as an error.
    pub fn commit(
        &self,
        items: Vec<StagingItem>,
        ct: &CancellationToken,
    ) -> Result<Vec<StagingItem>, IntakeError> {
        let mut summary = CommitSummary::default();
        let mut create = Vec::new();
        let mut attach = Vec::new();

        for item in items {
            if !item.selected {
                summary.skipped += 1;
                continue;
            }
            let action = item.suggested_action;
            match action {
                SuggestedAction::Duplicate | SuggestedAction::Skip => {
                    summary.skipped += 1;
                    self.skipped(&item, format!("suggested action is {}", action));
                }
                SuggestedAction::Attachment => attach.push(item),
                _ => create.push(item),
            }
        }

        let mut titles = TitleMap::new();
        let mut committed = Vec::new();

        self.events.commit(CommitEvent::PassStarted {
            pass: CommitPass::Create,
            items: create.len(),
        });
        for item in create {
            ct.check()?;
            match self.create_entry(&item, &titles, ct) {
                Ok(done) => {
                    for key in [&item.display_name, &item.title] {
                        let key = normalize_title(key);
                        if !key.is_empty() {
                            titles.insert(key, done.entry_id.clone());
                        }
                    }
                    summary.created += 1;
                    self.finish(&item, &done, CommitPass::Create);
                    committed.push(item);
                }
                Err(CommitError::Cancelled) => return Err(IntakeError::Cancelled),
                Err(e) => {
                    summary.failed += 1;
                    self.failed(&item, &e);
                }
            }
        }

        self.events.commit(CommitEvent::PassStarted {
            pass: CommitPass::Attach,
            items: attach.len(),
        });
        for item in attach {
            ct.check()?;
            match self.attach(&item, &titles, ct) {
                Ok(done) => {
                    summary.attached += 1;
                    self.finish(&item, &done, CommitPass::Attach);
                    committed.push(item);
                }
                Err(CommitError::Cancelled) => return Err(IntakeError::Cancelled),
                Err(e @ CommitError::TargetUnresolved { .. })
                | Err(e @ CommitError::TargetMissing { .. }) => {
                    summary.skipped += 1;
                    self.skipped(&item, e.to_string());
                }
                Err(e) => {
                    summary.failed += 1;
                    self.failed(&item, &e);
                }
            }
        }

        tracing::info!(
            created = summary.created,
            attached = summary.attached,
            skipped = summary.skipped,
            failed = summary.failed,
            "Commit completed"
        );
        self.events.commit(CommitEvent::Completed(summary));

        Ok(committed)
    }

    /// Explicit target id first, then a title created earlier in this call
    fn resolve_target(item: &StagingItem, titles: &TitleMap) -> Option<String> {
        if let Some(id) = item.target_entry_id.as_deref().filter(|id| !id.is_empty()) {
            return Some(id.to_string());
        }
        item.similar_to_title
            .as_deref()
            .and_then(|title| titles.get(&normalize_title(title)))
            .cloned()
    }

    fn store_file(
        &self,
        path: &Path,
        area: StorageArea,
        extension: &str,
        ct: &CancellationToken,
    ) -> Result<(String, PathBuf), CommitError> {
        ct.check()?;
        let hash = self.services.hasher.compute_hash(path)?;
        ct.check()?;
        let stored = self
            .services
            .storage
            .copy_into_storage(path, area, &format!("{}{}", hash, extension))?;
        Ok((hash, stored))
    }

    fn create_entry(
        &self,
        item: &StagingItem,
        titles: &TitleMap,
        ct: &CancellationToken,
    ) -> Result<Committed, CommitError> {
        let (hash, stored_path) =
            self.store_file(&item.path, StorageArea::Library, &item.dotted_extension(), ct)?;

        let relation = match item.suggested_action {
            SuggestedAction::Variant => Some(Relation::VariantOf),
            SuggestedAction::Version => Some(Relation::VersionOf),
            _ => None,
        };
        let mut relation_tags = Vec::new();
        if let Some(relation) = relation {
            match Self::resolve_target(item, titles) {
                Some(target) => relation_tags.push(relation.tag(&target)),
                None => tracing::warn!(
                    path = %item.path.display(),
                    "No target for {}, creating without relation",
                    item.suggested_action
                ),
            }
        }

        let mut entry = Entry {
            id: None,
            entry_type: item.item_type,
            title: item.title.clone(),
            display_name: item.display_name.clone(),
            year: item.year,
            source: item.source.clone(),
            authors: item.authors.clone(),
            doi: item.doi.clone(),
            pmid: item.pmid.clone(),
            internal_id: item.internal_id.clone(),
            tags: item.tags.clone(),
            notes: item.notes.clone(),
            main_file: stored_path.clone(),
            main_file_hash_sha256: hash.clone(),
            attachments: Vec::new(),
            relation_tags,
            added_at: Some(Utc::now()),
        };

        ct.check()?;
        let entry_id = self.services.store.save(&mut entry)?;
        Ok(Committed {
            entry_id,
            stored_path,
            hash,
        })
    }

    /// Copy, append, then save, so a saved entry never references a file
    /// that was not stored.
    fn attach(
        &self,
        item: &StagingItem,
        titles: &TitleMap,
        ct: &CancellationToken,
    ) -> Result<Committed, CommitError> {
        let target = Self::resolve_target(item, titles).ok_or_else(|| {
            CommitError::TargetUnresolved {
                path: item.path.clone(),
            }
        })?;

        ct.check()?;
        let mut entry = self
            .services
            .store
            .find_by_id(&target)?
            .ok_or_else(|| CommitError::TargetMissing { id: target.clone() })?;

        let (hash, stored_path) =
            self.store_file(&item.path, StorageArea::Attachments, &item.dotted_extension(), ct)?;

        entry.attachments.push(Attachment {
            relative_path: stored_path.clone(),
            title: item.title.clone(),
            kind: item.attachment_kind,
            tags: item.tags.clone(),
            added_by: self.added_by.clone(),
            added_at: Utc::now(),
        });

        ct.check()?;
        let entry_id = self.services.store.save(&mut entry)?;
        Ok(Committed {
            entry_id,
            stored_path,
            hash,
        })
    }

    fn finish(&self, item: &StagingItem, done: &Committed, pass: CommitPass) {
        tracing::debug!(path = %item.path.display(), entry_id = %done.entry_id, %pass, "Committed");
        self.events.commit(CommitEvent::ItemCommitted {
            path: item.path.clone(),
            entry_id: done.entry_id.clone(),
            pass,
        });

        if self.services.hooks.is_empty() {
            return;
        }
        let context =
            HookContextBuilder::build(item, &done.entry_id, &done.stored_path, &done.hash, pass);
        for hook in &self.services.hooks {
            if let Err(e) = hook.on_commit(&context) {
                tracing::warn!(
                    path = %item.path.display(),
                    entry_id = %done.entry_id,
                    error = %e,
                    "Commit hook failed"
                );
            }
        }
    }

    fn skipped(&self, item: &StagingItem, reason: String) {
        tracing::warn!(path = %item.path.display(), reason = %reason, "Skipped item");
        self.events.commit(CommitEvent::ItemSkipped {
            path: item.path.clone(),
            reason,
        });
    }

    fn failed(&self, item: &StagingItem, error: &CommitError) {
        tracing::warn!(path = %item.path.display(), error = %error, "Failed to commit item");
        self.events.commit(CommitEvent::ItemFailed {
            path: item.path.clone(),
            message: error.to_string(),
        });
    }
}

//! Turns extraction output and a [`Match`] into a [`StagingItem`].

use crate::core::model::{
    ExtractedMeta, Match, MatchKind, PublicationRecord, StagingItem, SuggestedAction,
    NEAR_THRESHOLD,
};
use std::path::Path;

/// Builds staging items; holds no state.
#[derive(Debug, Clone, Copy, Default)]
pub struct StagingAssembler;

impl StagingAssembler {
    pub fn new() -> Self {
        Self
    }

    pub fn assemble(
        &self,
        path: &Path,
        meta: &ExtractedMeta,
        publication: Option<PublicationRecord>,
        found: &Match,
    ) -> StagingItem {
        let mut item = StagingItem::new(path);

        if let Some(title) = meta.clean_title() {
            item.title = title.to_string();
        } else if let Some(title) = publication
            .as_ref()
            .and_then(|p| p.title.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            item.title = title.to_string();
        }

        item.authors = meta.authors.clone();
        item.year = meta.year.or_else(|| publication.as_ref().and_then(|p| p.year));
        item.source = meta
            .source
            .clone()
            .or_else(|| publication.as_ref().and_then(|p| p.journal.clone()));
        item.doi = meta.doi.clone();
        item.pmid = meta.pmid.clone();
        item.tags = meta.tags.clone();

        item.similarity = found.score;
        item.match_kind = found.kind;
        item.similar_to_id = found.entry_id.clone();
        item.similar_to_title = found.title.clone();
        item.suggested_action = Self::suggest(found);
        item.selected = item.suggested_action != SuggestedAction::Duplicate;

        let authors = match &publication {
            Some(p) if !p.authors.is_empty() => p.authors.as_slice(),
            _ => meta.authors.as_slice(),
        };
        item.display_name = display_name(authors, item.year, &item.title);
        item.publication = publication;

        item
    }

    /// `Duplicate` for exact matches or scores at the duplicate threshold,
    /// `Review` for content near-matches, else `New`
    pub fn suggest(found: &Match) -> SuggestedAction {
        if found.is_duplicate() {
            SuggestedAction::Duplicate
        } else if found.kind == MatchKind::Content && found.score >= NEAR_THRESHOLD {
            SuggestedAction::Review
        } else {
            SuggestedAction::New
        }
    }
}

/// `Smith et al - 2020 - Title`, `Smith - 2020 - Title` or `n.d. - Title`
pub fn display_name(authors: &[String], year: Option<i32>, title: &str) -> String {
    let year = year.map_or_else(|| "n.d.".to_string(), |y| y.to_string());

    match authors.first().map(|a| last_name(a)).filter(|l| !l.is_empty()) {
        Some(last) if authors.len() > 1 => format!("{} et al - {} - {}", last, year, title),
        Some(last) => format!("{} - {} - {}", last, year, title),
        None => format!("{} - {}", year, title),
    }
}

/// Family name from `Last, First` or `First Last`
pub fn last_name(author: &str) -> &str {
    let author = author.trim();
    match author.split_once(',') {
        Some((last, _)) => last.trim(),
        None => author.split_whitespace().last().unwrap_or(""),
    }
}

//! # Model Module
//!
//! Value types shared by staging and commit.
//!
//! - [`ExtractedMeta`] - what a metadata extractor pulled out of one file
//! - [`PublicationRecord`] - authoritative metadata from a DOI lookup
//! - [`Match`] - the fingerprint resolver's verdict for one file
//! - [`StagingItem`] - a candidate awaiting a user decision
//! - [`Entry`] / [`Attachment`] - persisted library records

mod entry;
mod item;

pub use entry::{Attachment, AttachmentKind, Entry, Relation};
pub use item::{ItemType, StagingItem, SuggestedAction};

use serde::{Deserialize, Serialize};

/// Scores at or above this are confirmed duplicates.
pub const DUPLICATE_THRESHOLD: f64 = 0.999;

/// Scores at or above this (and below [`DUPLICATE_THRESHOLD`]) need manual review.
pub const NEAR_THRESHOLD: f64 = 0.75;

/// Returns `true` if `score` classifies as a duplicate
pub fn is_duplicate_score(score: f64) -> bool {
    score >= DUPLICATE_THRESHOLD
}

/// Returns `true` if `score` classifies as a near-match
pub fn is_near_score(score: f64) -> bool {
    (NEAR_THRESHOLD..DUPLICATE_THRESHOLD).contains(&score)
}

/// Best-effort metadata extracted from one file.
///
/// Only lives while a single file is being staged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedMeta {
    pub title: Option<String>,
    /// Authors in document order, each as written ("Last, First" or "First Last")
    pub authors: Vec<String>,
    pub year: Option<i32>,
    /// Journal or other source
    pub source: Option<String>,
    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub tags: Vec<String>,
}

impl ExtractedMeta {
    /// Title with surrounding whitespace removed, if any text remains
    pub fn clean_title(&self) -> Option<&str> {
        self.title.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Whether a DOI or PMID is available for an indexed lookup
    pub fn has_identifiers(&self) -> bool {
        self.doi.is_some() || self.pmid.is_some()
    }
}

/// Authoritative publication metadata returned by a DOI lookup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicationRecord {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub journal: Option<String>,
    pub doi: Option<String>,
}

/// How a [`Match`] was established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchKind {
    /// Nothing in the library resembles the file
    None,
    /// The content digest is already stored
    Hash,
    /// A DOI or PMID matched an existing entry
    IdExact,
    /// Best content-similarity candidate
    Content,
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchKind::None => write!(f, "No match"),
            MatchKind::Hash => write!(f, "Identical content"),
            MatchKind::IdExact => write!(f, "Same identifier"),
            MatchKind::Content => write!(f, "Similar content"),
        }
    }
}

/// Outcome of fingerprinting one file against the library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub entry_id: Option<String>,
    pub title: Option<String>,
    pub score: f64,
    pub kind: MatchKind,
}

impl Match {
    /// No candidate found
    pub fn none() -> Self {
        Self {
            entry_id: None,
            title: None,
            score: 0.0,
            kind: MatchKind::None,
        }
    }

    /// Exact content digest match
    pub fn hash(entry: &Entry) -> Self {
        Self::exact(entry, MatchKind::Hash)
    }

    /// Exact identifier match
    pub fn identifier(entry: &Entry) -> Self {
        Self::exact(entry, MatchKind::IdExact)
    }

    fn exact(entry: &Entry, kind: MatchKind) -> Self {
        Self {
            entry_id: entry.id.clone(),
            title: Some(entry.display_title().to_string()),
            score: 1.0,
            kind,
        }
    }

    /// Content-similarity result
    pub fn content(entry_id: String, title: String, score: f64) -> Self {
        Self {
            entry_id: Some(entry_id),
            title: Some(title),
            score,
            kind: MatchKind::Content,
        }
    }

    /// Hash and identifier matches are always duplicates; content matches
    /// only when the score reaches [`DUPLICATE_THRESHOLD`].
    pub fn is_duplicate(&self) -> bool {
        matches!(self.kind, MatchKind::Hash | MatchKind::IdExact) || is_duplicate_score(self.score)
    }

    /// A content match worth reviewing by hand
    pub fn is_near(&self) -> bool {
        self.kind == MatchKind::Content && self.score >= NEAR_THRESHOLD && !self.is_duplicate()
    }
}

/// Lowercase, replace non-alphanumerics with spaces, collapse whitespace.
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .replace(|c: char| !c.is_alphanumeric(), " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Loose title + year comparison used for narrow candidate probes.
///
/// Titles resemble each other when their normalized forms are equal or one
/// contains the other (minimum 8 characters). Years must agree when both
/// are known.
pub fn titles_resemble(a: &str, a_year: Option<i32>, b: &str, b_year: Option<i32>) -> bool {
    if let (Some(x), Some(y)) = (a_year, b_year) {
        if x != y {
            return false;
        }
    }

    let a = normalize_title(a);
    let b = normalize_title(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }

    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    short.len() >= 8 && long.contains(short.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_threshold_is_inclusive() {
        assert!(is_duplicate_score(0.999));
        assert!(!is_duplicate_score(0.998));
        assert!(is_duplicate_score(1.0));
    }

    #[test]
    fn near_threshold_boundaries() {
        assert!(is_near_score(0.75));
        assert!(is_near_score(0.998));
        assert!(!is_near_score(0.749));
        assert!(!is_near_score(0.999));
    }

    #[test]
    fn hash_match_is_duplicate_regardless_of_kind() {
        let entry = Entry {
            id: Some("e1".to_string()),
            title: "Paper".to_string(),
            ..Entry::default()
        };
        let matched = Match::hash(&entry);
        assert_eq!(matched.score, 1.0);
        assert_eq!(matched.kind, MatchKind::Hash);
        assert!(matched.is_duplicate());
        assert!(!matched.is_near());
    }

    #[test]
    fn content_match_near_only_below_duplicate() {
        let near = Match::content("e1".into(), "Paper".into(), 0.8);
        assert!(near.is_near());
        assert!(!near.is_duplicate());

        let dup = Match::content("e1".into(), "Paper".into(), 0.999);
        assert!(dup.is_duplicate());
        assert!(!dup.is_near());
    }

    #[test]
    fn normalize_title_collapses_punctuation() {
        assert_eq!(
            normalize_title("  Deep-Learning:  A Survey! "),
            "deep learning a survey"
        );
    }

    #[test]
    fn titles_resemble_on_containment() {
        assert!(titles_resemble(
            "Attention is all you need",
            Some(2017),
            "Attention Is All You Need (preprint)",
            Some(2017)
        ));
        assert!(!titles_resemble("Short", None, "Short and different", None));
    }

    #[test]
    fn titles_resemble_requires_matching_years() {
        assert!(!titles_resemble("Paper A", Some(2019), "Paper A", Some(2020)));
        assert!(titles_resemble("Paper A", None, "paper a", Some(2020)));
    }
}

//! The staging model: one candidate file awaiting a user decision.

use super::{
    is_duplicate_score, is_near_score, AttachmentKind, MatchKind, PublicationRecord,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What the pipeline proposes to do with a staged file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SuggestedAction {
    /// Create a new entry
    New,
    /// Already in the library; never committed
    Duplicate,
    /// Near-match; a human should decide
    Review,
    /// Append to an existing (or same-batch) entry
    Attachment,
    /// Create a new entry tagged as a variant of its target
    Variant,
    /// Create a new entry tagged as a version of its target
    Version,
    /// Leave out of the library
    Skip,
}

impl SuggestedAction {
    /// Actions handled by the create pass
    pub fn creates_entry(&self) -> bool {
        matches!(
            self,
            SuggestedAction::New
                | SuggestedAction::Review
                | SuggestedAction::Variant
                | SuggestedAction::Version
        )
    }
}

impl std::fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SuggestedAction::New => "New",
            SuggestedAction::Duplicate => "Duplicate",
            SuggestedAction::Review => "Review",
            SuggestedAction::Attachment => "Attachment",
            SuggestedAction::Variant => "Variant",
            SuggestedAction::Version => "Version",
            SuggestedAction::Skip => "Skip",
        };
        write!(f, "{}", name)
    }
}

/// Coarse document type, derived from the file extension
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    Publication,
    Report,
    SlideDeck,
    #[default]
    Other,
}

impl ItemType {
    /// Classify from an extension (without the dot, any case)
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => ItemType::Publication,
            "doc" | "docx" => ItemType::Report,
            "ppt" | "pptx" => ItemType::SlideDeck,
            _ => ItemType::Other,
        }
    }

    /// Classify a path by its extension
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(ItemType::Other)
    }
}

/// A staged candidate.
///
/// Created by the assembler, edited by the user (selection, action,
/// target), consumed by the committer. Never persisted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagingItem {
    /// Unique key within a batch
    pub path: PathBuf,
    pub title: String,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub source: Option<String>,
    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub internal_id: Option<String>,
    pub item_type: ItemType,

    /// Best similarity score against the library, 0..=1
    pub similarity: f64,
    pub match_kind: MatchKind,
    /// Entry the resolver matched, if any
    pub similar_to_id: Option<String>,
    /// Title of the matched entry, or of an entry created earlier in the same commit
    pub similar_to_title: Option<String>,
    pub suggested_action: SuggestedAction,
    pub display_name: String,
    pub selected: bool,

    /// Explicit target for Attachment / Variant / Version, set by the user
    pub target_entry_id: Option<String>,
    pub attachment_kind: AttachmentKind,
    pub publication: Option<PublicationRecord>,
    /// Opaque payload from the optional evidence extractor
    pub enrichment: Option<serde_json::Value>,
}

impl StagingItem {
    /// Skeleton item with no metadata and no match
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let item_type = ItemType::from_path(&path);
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            display_name: title.clone(),
            path,
            title,
            authors: Vec::new(),
            year: None,
            source: None,
            doi: None,
            pmid: None,
            tags: Vec::new(),
            notes: None,
            internal_id: None,
            item_type,
            similarity: 0.0,
            match_kind: MatchKind::None,
            similar_to_id: None,
            similar_to_title: None,
            suggested_action: SuggestedAction::New,
            selected: true,
            target_entry_id: None,
            attachment_kind: AttachmentKind::default(),
            publication: None,
            enrichment: None,
        }
    }

    /// `similarity >= 0.999`
    pub fn is_duplicate(&self) -> bool {
        is_duplicate_score(self.similarity)
    }

    /// `0.75 <= similarity < 0.999`
    pub fn is_near_match(&self) -> bool {
        is_near_score(self.similarity)
    }

    /// Use the matched entry as the explicit target.
    pub fn target_matched_entry(&mut self) {
        if let Some(id) = &self.similar_to_id {
            self.target_entry_id = Some(id.clone());
        }
    }

    /// Lowercase extension including the leading dot, or empty
    pub fn dotted_extension(&self) -> String {
        self.path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default()
    }
}

//! Persisted library records.

use super::ItemType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A library record owned by an [`EntryStore`](crate::core::store::EntryStore).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Assigned by the store on first save
    pub id: Option<String>,
    pub entry_type: ItemType,
    pub title: String,
    /// User-facing name, e.g. "Smith et al - 2020 - Title"
    pub display_name: String,
    pub year: Option<i32>,
    pub source: Option<String>,
    pub authors: Vec<String>,
    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub internal_id: Option<String>,
    pub tags: Vec<String>,
    pub notes: Option<String>,
    /// Main file, relative to the storage root
    pub main_file: PathBuf,
    pub main_file_hash_sha256: String,
    pub attachments: Vec<Attachment>,
    /// Free-form `rel:<kind>-of:<id>` tags
    pub relation_tags: Vec<String>,
    pub added_at: Option<DateTime<Utc>>,
}

impl Entry {
    /// Display name, or the bare title for records saved without one
    pub fn display_title(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.title
        } else {
            &self.display_name
        }
    }

    /// Targets of relation tags of the given kind
    pub fn related(&self, relation: Relation) -> impl Iterator<Item = &str> + '_ {
        let prefix = relation.tag_prefix();
        self.relation_tags
            .iter()
            .filter_map(move |tag| tag.strip_prefix(prefix))
    }
}

/// Non-duplicate links from a new entry to an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    /// e.g. a translation or a differently formatted copy
    VariantOf,
    /// a newer or older revision
    VersionOf,
}

impl Relation {
    fn tag_prefix(&self) -> &'static str {
        match self {
            Relation::VariantOf => "rel:variant-of:",
            Relation::VersionOf => "rel:version-of:",
        }
    }

    /// Relation tag pointing at `target_id`
    pub fn tag(&self, target_id: &str) -> String {
        format!("{}{}", self.tag_prefix(), target_id)
    }
}

/// Kinds of files attached to an entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachmentKind {
    #[default]
    Supplement,
    Metadata,
    Slides,
    Other,
}

/// A file appended to exactly one [`Entry`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// Relative to the storage root
    pub relative_path: PathBuf,
    pub title: String,
    pub kind: AttachmentKind,
    pub tags: Vec<String>,
    pub added_by: String,
    pub added_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_tags_round_trip_through_related() {
        let entry = Entry {
            relation_tags: vec![
                Relation::VariantOf.tag("abc"),
                Relation::VersionOf.tag("def"),
                "unrelated".to_string(),
            ],
            ..Entry::default()
        };

        assert_eq!(entry.related(Relation::VariantOf).collect::<Vec<_>>(), vec!["abc"]);
        assert_eq!(entry.related(Relation::VersionOf).collect::<Vec<_>>(), vec!["def"]);
    }

    #[test]
    fn relation_tag_format() {
        assert_eq!(Relation::VariantOf.tag("42"), "rel:variant-of:42");
        assert_eq!(Relation::VersionOf.tag("42"), "rel:version-of:42");
    }

    #[test]
    fn display_title_falls_back_to_title() {
        let entry = Entry {
            title: "Raw title".to_string(),
            ..Entry::default()
        };
        assert_eq!(entry.display_title(), "Raw title");
    }
}

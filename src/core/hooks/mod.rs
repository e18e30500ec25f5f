//! # Hooks Module
//!
//! Side records derived from each committed item.
//!
//! The committer hands every successful item to [`HookContextBuilder`],
//! then passes the resulting [`HookContext`] to each registered
//! [`CommitHook`]. Hook failures are logged by the committer and never
//! roll back the commit.

mod changelog;

pub use changelog::ChangeLogRepository;

use crate::core::model::{StagingItem, SuggestedAction};
use crate::core::pipeline::last_name;
use crate::error::HookError;
use crate::events::CommitPass;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Citation-style record for one committed file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BibliographicRecord {
    pub entry_id: String,
    /// `{firstauthorlast}{year}{firsttitleword}`, lowercase ascii
    pub citation_key: String,
    pub title: String,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub source: Option<String>,
    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub stored_path: PathBuf,
    pub content_hash: String,
}

/// What a commit did to the library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeLogAction {
    Created,
    Variant,
    Version,
    Attached,
}

impl ChangeLogAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeLogAction::Created => "created",
            ChangeLogAction::Variant => "variant",
            ChangeLogAction::Version => "version",
            ChangeLogAction::Attached => "attached",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(ChangeLogAction::Created),
            "variant" => Some(ChangeLogAction::Variant),
            "version" => Some(ChangeLogAction::Version),
            "attached" => Some(ChangeLogAction::Attached),
            _ => None,
        }
    }
}

/// One change-log line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeLogEvent {
    pub id: String,
    pub entry_id: String,
    pub action: ChangeLogAction,
    /// Source file that was committed
    pub path: PathBuf,
    pub content_hash: String,
    pub timestamp: DateTime<Utc>,
}

/// Everything a hook receives for one committed item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookContext {
    pub bibliographic: BibliographicRecord,
    pub changelog: ChangeLogEvent,
    /// The item's enrichment payload, untouched
    pub enrichment: Option<serde_json::Value>,
}

/// Consumer of committed items
pub trait CommitHook: Send + Sync {
    fn on_commit(&self, context: &HookContext) -> Result<(), HookError>;
}

/// Builds [`HookContext`]s
pub struct HookContextBuilder;

impl HookContextBuilder {
    pub fn build(
        item: &StagingItem,
        entry_id: &str,
        stored_path: &Path,
        content_hash: &str,
        pass: CommitPass,
    ) -> HookContext {
        let action = match (pass, item.suggested_action) {
            (CommitPass::Attach, _) => ChangeLogAction::Attached,
            (CommitPass::Create, SuggestedAction::Variant) => ChangeLogAction::Variant,
            (CommitPass::Create, SuggestedAction::Version) => ChangeLogAction::Version,
            (CommitPass::Create, _) => ChangeLogAction::Created,
        };

        HookContext {
            bibliographic: BibliographicRecord {
                entry_id: entry_id.to_string(),
                citation_key: citation_key(&item.authors, item.year, &item.title),
                title: item.title.clone(),
                authors: item.authors.clone(),
                year: item.year,
                source: item.source.clone(),
                doi: item.doi.clone(),
                pmid: item.pmid.clone(),
                stored_path: stored_path.to_path_buf(),
                content_hash: content_hash.to_string(),
            },
            changelog: ChangeLogEvent {
                id: Uuid::new_v4().to_string(),
                entry_id: entry_id.to_string(),
                action,
                path: item.path.clone(),
                content_hash: content_hash.to_string(),
                timestamp: Utc::now(),
            },
            enrichment: item.enrichment.clone(),
        }
    }
}

/// `smith2020deep` from `Smith, Jane` / 2020 / `Deep learning`.
///
/// Missing parts are left out; non-ascii-alphanumerics are dropped.
pub fn citation_key(authors: &[String], year: Option<i32>, title: &str) -> String {
    let ascii = |s: &str| -> String {
        s.chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect()
    };

    let author = authors.first().map(|a| ascii(last_name(a))).unwrap_or_default();
    let year = year.map(|y| y.to_string()).unwrap_or_default();
    let word = title
        .split_whitespace()
        .map(ascii)
        .find(|w| !w.is_empty())
        .unwrap_or_default();

    format!("{}{}{}", author, year, word)
}

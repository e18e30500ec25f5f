//! Event type definitions for staging and commit progress.

use crate::core::model::SuggestedAction;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the intake pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Staging phase events
    Stage(StageEvent),
    /// Commit phase events
    Commit(CommitEvent),
}

/// Events while files are being fingerprinted and staged
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageEvent {
    /// Staging has started for the normalized input set
    Started { total: usize },
    /// One staged file was published, in path order
    FileStaged {
        index: usize,
        path: PathBuf,
        action: SuggestedAction,
    },
    /// One file failed and was dropped from the results
    FileFailed { path: PathBuf, message: String },
    /// An ordered batch was handed to the consumer
    BatchPublished { count: usize, next_index: usize },
    /// All files were processed
    Completed { staged: usize, failed: usize },
    /// Staging stopped because the token was cancelled
    Cancelled,
}

/// The two sequential commit passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitPass {
    /// New, Variant and Version entries are created
    Create,
    /// Attachments are appended to resolved targets
    Attach,
}

/// Events while accepted items are persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CommitEvent {
    /// A pass is starting with this many eligible items
    PassStarted { pass: CommitPass, items: usize },
    /// An item was persisted
    ItemCommitted {
        path: PathBuf,
        entry_id: String,
        pass: CommitPass,
    },
    /// An item was deliberately not persisted
    ItemSkipped { path: PathBuf, reason: String },
    /// An item failed; the pass continues
    ItemFailed { path: PathBuf, message: String },
    /// Both passes finished
    Completed(CommitSummary),
}

/// Summary of one commit call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    /// Entries created in pass 1
    pub created: usize,
    /// Attachments appended in pass 2
    pub attached: usize,
    /// Items skipped (unselected, duplicate, unresolved target)
    pub skipped: usize,
    /// Items that failed
    pub failed: usize,
}

impl std::fmt::Display for CommitPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommitPass::Create => write!(f, "Creating entries"),
            CommitPass::Attach => write!(f, "Attaching files"),
        }
    }
}

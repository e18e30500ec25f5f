//! # Error Module
//!
//! Error types for the document intake pipeline.
//!
//! ## Design Principles
//! - **Never abort a batch** for one bad file - per-file errors are logged and skipped
//! - **Include context** - paths, entry ids, what went wrong
//! - **Cancellation is special** - it is the only error that escapes staging and commit

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Operation was cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Entry store error: {0}")]
    Store(#[from] StoreError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while computing a content digest
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to read {path} for hashing: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while extracting metadata from a file
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("File is not readable: {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("Unsupported document type: {path}")]
    Unsupported { path: PathBuf },
}

/// Errors that occur while scoring one candidate against a source file
#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("Failed to read {path} for scoring: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Similarity scoring failed for {path}: {reason}")]
    Failed { path: PathBuf, reason: String },
}

/// Errors that occur during an authoritative publication lookup
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Publication lookup for {doi} failed: {reason}")]
    Failed { doi: String, reason: String },
}

/// Errors from an entry store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open entry store at {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("Entry store query failed: {0}")]
    QueryFailed(String),

    #[error("Entry store does not support {0}")]
    Unsupported(&'static str),

    #[error("Entry store corruption detected at {path}. Delete this file and try again.")]
    Corrupted { path: PathBuf },

    #[error("Failed to serialize entry data: {0}")]
    SerializationFailed(String),
}

/// Errors from blob storage
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Source file not found: {path}")]
    MissingSource { path: PathBuf },

    #[error("Failed to copy {source_path} into {target}: {source}")]
    CopyFailed {
        source_path: PathBuf,
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Copy verification failed for {target}: source {expected} bytes, stored {actual} bytes"
    )]
    VerificationFailed {
        target: PathBuf,
        expected: u64,
        actual: u64,
    },
}

/// Errors raised by downstream commit hooks
#[derive(Error, Debug)]
pub enum HookError {
    #[error("Commit hook failed: {0}")]
    Failed(String),
}

/// Why staging a single file failed
#[derive(Error, Debug)]
pub enum StagingError {
    #[error("Staging was cancelled")]
    Cancelled,

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Score(#[from] ScoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Staging task panicked for {path}")]
    Panicked { path: PathBuf },
}

/// Why committing a single item failed
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("Commit was cancelled")]
    Cancelled,

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("No target entry could be resolved for {path}")]
    TargetUnresolved { path: PathBuf },

    #[error("Target entry {id} could not be loaded")]
    TargetMissing { id: String },
}

/// Raised by [`CancellationToken::check`](crate::core::pipeline::CancellationToken::check)
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Operation was cancelled")]
pub struct Cancelled;

impl From<Cancelled> for IntakeError {
    fn from(_: Cancelled) -> Self {
        IntakeError::Cancelled
    }
}

impl From<Cancelled> for StagingError {
    fn from(_: Cancelled) -> Self {
        StagingError::Cancelled
    }
}

impl From<Cancelled> for CommitError {
    fn from(_: Cancelled) -> Self {
        CommitError::Cancelled
    }
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, IntakeError>;

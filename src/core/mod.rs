//! # Core Module
//!
//! The UI-agnostic document intake engine.
//!
//! ## Modules
//! - `scanner` - Expands folders into candidate documents
//! - `hasher` - Content digests
//! - `metadata` - Extraction, identifier normalization, publication lookup
//! - `similarity` - Pairwise content similarity
//! - `store` - Durable entry stores
//! - `storage` - Content-addressed blob storage
//! - `model` - Staging items, matches and entries
//! - `pipeline` - Fingerprinting, staging and two-pass commit
//! - `hooks` - Bibliographic and change-log side records

pub mod hasher;
pub mod hooks;
pub mod metadata;
pub mod model;
pub mod pipeline;
pub mod scanner;
pub mod similarity;
pub mod storage;
pub mod store;

// Re-export commonly used types
pub use model::{Entry, Match, MatchKind, StagingItem, SuggestedAction};
pub use pipeline::{CancellationToken, IntakeConfig, IntakePipeline};

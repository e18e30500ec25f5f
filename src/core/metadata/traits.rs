//! Trait definitions for metadata sources.

use crate::core::model::{ExtractedMeta, PublicationRecord};
use crate::error::{ExtractError, LookupError};
use std::path::Path;

/// Best-effort extraction of title, authors, year, identifiers and tags.
pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<ExtractedMeta, ExtractError>;
}

/// Normalizes identifiers so equal DOIs/PMIDs compare equal.
///
/// Returning `None` means the input is not a usable identifier.
pub trait IdentifierNormalizer: Send + Sync {
    fn normalize_doi(&self, raw: &str) -> Option<String>;
    fn normalize_pmid(&self, raw: &str) -> Option<String>;
}

/// Authoritative publication metadata by DOI. Network-backed and optional.
pub trait PublicationLookup: Send + Sync {
    fn lookup_doi(&self, doi: &str) -> Result<Option<PublicationRecord>, LookupError>;
}

/// Optional evidence / data-extraction preprocessing for publications.
///
/// The payload is attached to the staged item verbatim and handed to
/// commit hooks untouched.
pub trait EvidenceExtractor: Send + Sync {
    fn extract_evidence(&self, path: &Path) -> Result<Option<serde_json::Value>, ExtractError>;
}

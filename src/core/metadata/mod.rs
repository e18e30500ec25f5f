//! # Metadata Module
//!
//! Metadata sources consulted while staging a file.
//!
//! ## Services
//! - [`MetadataExtractor`] - title/authors/year/identifiers from the file
//! - [`IdentifierNormalizer`] - canonical DOI/PMID forms
//! - [`PublicationLookup`] - authoritative metadata by DOI (optional)
//! - [`EvidenceExtractor`] - opaque preprocessing payload (optional)
//!
//! Only the first is required; the rest fall back to trimming identifiers,
//! no lookup and no enrichment.

mod filename;
mod normalize;
mod traits;

pub use filename::FilenameExtractor;
pub use normalize::{StandardNormalizer, TrimNormalizer};
pub use traits::{EvidenceExtractor, IdentifierNormalizer, MetadataExtractor, PublicationLookup};

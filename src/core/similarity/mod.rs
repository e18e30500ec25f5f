//! # Similarity Module
//!
//! Pairwise content-similarity scoring used by the fingerprint cascade.
//!
//! | Score        | Classification |
//! |--------------|----------------|
//! | >= 0.999     | Duplicate      |
//! | 0.75 - 0.999 | Near-match     |
//! | < 0.75       | Different      |

mod shingle;
mod traits;

pub use shingle::ShingleScorer;
pub use traits::SimilarityScorer;
